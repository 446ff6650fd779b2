//! Async driver for a room session.
//!
//! One tokio task owns the controller. Timer deadlines and inbound commands
//! are multiplexed through a single `select!`, so every decision - phase
//! entry, nudge, message admission - is serialized and transcript order is
//! decision order. Task exit tears both timers down with it: there is no
//! callback that could fire after shutdown.

use std::time::SystemTime;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

use hearth_types::ParticipantId;

use crate::controller::{MessageOutcome, RoomEvent, RoomLifecycleController, TranscriptEntry};
use crate::random::RandomSource;

const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// The room's driver task has exited; no further interaction is possible.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("room is closed")]
pub struct RoomClosedError;

enum Command {
    Post {
        sender: ParticipantId,
        text: String,
        reply: oneshot::Sender<MessageOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<TranscriptEntry>>,
    },
    Shutdown,
}

/// Client handle to a spawned room. Cheap to clone; dropping every handle
/// closes the command channel and tears the room down.
#[derive(Clone)]
pub struct RoomHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<RoomEvent>,
}

impl RoomHandle {
    /// Post a message; resolves once the controller has decided admission.
    pub async fn post_message(
        &self,
        sender: ParticipantId,
        text: impl Into<String>,
    ) -> Result<MessageOutcome, RoomClosedError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Post {
                sender,
                text: text.into(),
                reply,
            })
            .await
            .map_err(|_| RoomClosedError)?;
        response.await.map_err(|_| RoomClosedError)
    }

    /// Current transcript, in decision order.
    pub async fn transcript(&self) -> Result<Vec<TranscriptEntry>, RoomClosedError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| RoomClosedError)?;
        response.await.map_err(|_| RoomClosedError)
    }

    /// Subscribe to phase-change, nudge, message, and notice events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.events.subscribe()
    }

    /// Ask the driver to stop. Pending timers are cancelled with the task;
    /// nothing is emitted afterwards. Idempotent.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}

/// Spawned room session: the handle plus the driver task for hosts that want
/// to await full teardown.
pub struct RoomRuntime {
    handle: RoomHandle,
    task: JoinHandle<()>,
}

impl RoomRuntime {
    /// Spawn the driver task for an already-started controller.
    ///
    /// The controller's opening ARRIVAL prompt was emitted at `start`; from
    /// here on, all state lives inside the task.
    #[must_use]
    pub fn spawn<R>(controller: RoomLifecycleController<R>) -> Self
    where
        R: RandomSource + Send + 'static,
    {
        let (commands, inbox) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let events = controller.event_sender();
        let task = tokio::spawn(drive(controller, inbox));
        Self {
            handle: RoomHandle { commands, events },
            task,
        }
    }

    #[must_use]
    pub fn handle(&self) -> RoomHandle {
        self.handle.clone()
    }

    /// Shut down and wait for the driver task to finish.
    pub async fn shutdown(self) {
        self.handle.shutdown().await;
        let _ = self.task.await;
    }
}

async fn drive<R: RandomSource>(
    mut controller: RoomLifecycleController<R>,
    mut inbox: mpsc::Receiver<Command>,
) {
    loop {
        let command = match controller.next_deadline() {
            Some(deadline) => {
                tokio::select! {
                    command = inbox.recv() => command,
                    () = time::sleep_until(deadline) => {
                        controller.advance_to(Instant::now(), SystemTime::now());
                        continue;
                    }
                }
            }
            // Session over; only commands can arrive now
            None => inbox.recv().await,
        };
        match command {
            Some(Command::Post {
                sender,
                text,
                reply,
            }) => {
                let outcome = controller.post_message(sender, &text, SystemTime::now());
                let _ = reply.send(outcome);
            }
            Some(Command::Snapshot { reply }) => {
                let _ = reply.send(controller.transcript().to_vec());
            }
            Some(Command::Shutdown) | None => break,
        }
    }
    debug!(room_id = %controller.room().id(), "room driver stopped");
}
