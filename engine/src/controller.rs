//! Room lifecycle controller.
//!
//! Owns one room's roster, transcript, and lifecycle machine, and gates every
//! inbound message through the safety scanner. The controller - not any
//! transport - decides transcript order: entries land in the order their
//! events were decided (phase entry, timer fire, message admission).
//!
//! Admission policy, per scan outcome:
//! - self-harm (high): suppressed, crisis resources to the poster only, one
//!   [`FlaggedEvent`] appended to the moderation sink
//! - graphic (moderate): suppressed, reminder to the poster, no sink event
//! - despair (moderate): admitted, supportive notice layered on top
//! - clear: admitted
//!
//! Despair language is never blocked: cutting someone off mid-crisis is worse
//! than the words themselves. Graphic detail is blocked to protect the rest of
//! the room.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

use hearth_types::{
    FlagKind, FlaggedEvent, ParticipantId, PhaseConfig, PhaseId, PhaseSchedule, RoomState,
    SafetyFlag, SafetyScanResult,
};

use crate::lifecycle::{Emission, LifecycleState, NudgeConfig};
use crate::moderation::ModerationSink;
use crate::random::{RandomSource, ThreadRandom};
use crate::scanner::SafetyScanner;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Who produced a transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Sender {
    /// Facilitation prompts and nudges.
    System,
    Participant(ParticipantId),
}

/// One admitted line of the room conversation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptEntry {
    pub seq: u64,
    pub sender: Sender,
    pub text: String,
    pub timestamp: SystemTime,
}

/// Events fanned out to room subscribers, in decision order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    PhaseChanged { phase: PhaseId, prompt: String },
    Nudge { text: String },
    MessageAdmitted { entry: TranscriptEntry },
    /// Guidance addressed to one participant; not part of the shared
    /// transcript.
    Notice {
        recipient: ParticipantId,
        flag: SafetyFlag,
    },
}

/// Result of a message-post attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOutcome {
    /// Whether the message made it into the transcript.
    pub admitted: bool,
    /// Guidance for the poster, present for any flagged message.
    pub notice: Option<SafetyFlag>,
}

/// Phase schedule and nudge cadence for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub schedule: PhaseSchedule,
    pub nudges: NudgeConfig,
}

/// Drives one assembled room through its phased session.
///
/// Single logical timeline: all mutation funnels through `&mut self`, so two
/// rooms in one process share nothing. The async driver in `runtime`
/// owns the instance; tests can also drive it directly with explicit instants.
pub struct RoomLifecycleController<R = ThreadRandom> {
    room: RoomState,
    lifecycle: LifecycleState,
    scanner: SafetyScanner,
    sink: Arc<dyn ModerationSink>,
    random: R,
    transcript: Vec<TranscriptEntry>,
    events: broadcast::Sender<RoomEvent>,
    next_seq: u64,
}

impl<R: RandomSource> RoomLifecycleController<R> {
    /// Create the controller and enter ARRIVAL at `now`, emitting its system
    /// prompt as the first transcript entry.
    pub fn start(
        room: RoomState,
        settings: SessionSettings,
        scanner: SafetyScanner,
        sink: Arc<dyn ModerationSink>,
        random: R,
        now: Instant,
        wall: SystemTime,
    ) -> Self {
        let (lifecycle, opening) = LifecycleState::start(settings.schedule, settings.nudges, now);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let mut controller = Self {
            room,
            lifecycle,
            scanner,
            sink,
            random,
            transcript: Vec::new(),
            events,
            next_seq: 0,
        };
        controller.apply_emission(opening, wall);
        controller
    }

    #[must_use]
    pub fn room(&self) -> &RoomState {
        &self.room
    }

    #[must_use]
    pub fn current_phase(&self) -> &PhaseConfig {
        self.lifecycle.current_config()
    }

    #[must_use]
    pub fn time_remaining(&self, now: Instant) -> Duration {
        self.lifecycle.time_remaining(now)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.lifecycle.is_finished()
    }

    #[must_use]
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Earliest pending timer deadline; `None` once the session is over.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lifecycle.next_deadline()
    }

    /// Subscribe to phase-change, nudge, message, and notice events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<RoomEvent> {
        self.events.clone()
    }

    /// Fire every timer deadline due at `now`, appending system entries in
    /// decision order.
    pub fn advance_to(&mut self, now: Instant, wall: SystemTime) {
        for emission in self.lifecycle.advance_to(now, &mut self.random) {
            self.apply_emission(emission, wall);
        }
    }

    /// Gate one message through the safety scanner and apply the admission
    /// policy. `wall` is the decision timestamp; callers own the clock.
    pub fn post_message(
        &mut self,
        sender: ParticipantId,
        text: &str,
        wall: SystemTime,
    ) -> MessageOutcome {
        match self.scanner.scan(text) {
            SafetyScanResult::Clear => {
                self.admit(sender, text, wall);
                MessageOutcome {
                    admitted: true,
                    notice: None,
                }
            }
            SafetyScanResult::Flagged(flag) => match flag.kind {
                FlagKind::SelfHarm => {
                    warn!(
                        room_id = %self.room.id(),
                        trigger = flag.trigger_word,
                        "high-severity message suppressed"
                    );
                    self.sink.append_flagged_event(FlaggedEvent {
                        room_id: self.room.id(),
                        timestamp: wall,
                        trigger_word: flag.trigger_word.clone(),
                    });
                    self.notify(sender, flag.clone());
                    MessageOutcome {
                        admitted: false,
                        notice: Some(flag),
                    }
                }
                FlagKind::Graphic => {
                    // Suppressed to spare the room, but not a moderation-queue event
                    debug!(room_id = %self.room.id(), "graphic message suppressed");
                    self.notify(sender, flag.clone());
                    MessageOutcome {
                        admitted: false,
                        notice: Some(flag),
                    }
                }
                FlagKind::Despair => {
                    self.admit(sender.clone(), text, wall);
                    self.notify(sender, flag.clone());
                    MessageOutcome {
                        admitted: true,
                        notice: Some(flag),
                    }
                }
            },
        }
    }

    fn apply_emission(&mut self, emission: Emission, wall: SystemTime) {
        match emission {
            Emission::PhaseEntered { phase, prompt } => {
                self.append(Sender::System, prompt.clone(), wall);
                let _ = self.events.send(RoomEvent::PhaseChanged { phase, prompt });
            }
            Emission::Nudge { text } => {
                self.append(Sender::System, text.clone(), wall);
                let _ = self.events.send(RoomEvent::Nudge { text });
            }
        }
    }

    fn admit(&mut self, sender: ParticipantId, text: &str, wall: SystemTime) {
        let entry = self.append(Sender::Participant(sender), text.to_string(), wall);
        let _ = self.events.send(RoomEvent::MessageAdmitted { entry });
    }

    fn notify(&mut self, recipient: ParticipantId, flag: SafetyFlag) {
        let _ = self.events.send(RoomEvent::Notice { recipient, flag });
    }

    fn append(&mut self, sender: Sender, text: String, timestamp: SystemTime) -> TranscriptEntry {
        let entry = TranscriptEntry {
            seq: self.next_seq,
            sender,
            text,
            timestamp,
        };
        self.next_seq += 1;
        self.transcript.push(entry.clone());
        entry
    }
}
