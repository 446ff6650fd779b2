//! Moderation sink boundary.
//!
//! High-severity flags produce a [`FlaggedEvent`] that the controller hands to
//! an external sink, fire-and-forget. The seam is a trait so a host can plug
//! in a durable queue; the in-memory sink covers tests and single-process
//! embedding.

use std::fs::{File, OpenOptions};
use std::io::{self, Write as _};
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;

use hearth_types::FlaggedEvent;

/// Append-only destination for high-severity flag records.
///
/// Implementations must not fail visibly; a sink that cannot persist should
/// log and drop the event.
pub trait ModerationSink: Send + Sync {
    fn append_flagged_event(&self, event: FlaggedEvent);
}

/// In-process sink for tests and single-process hosts.
#[derive(Debug, Default)]
pub struct MemoryModerationSink {
    events: Mutex<Vec<FlaggedEvent>>,
}

impl MemoryModerationSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far, in append order.
    #[must_use]
    pub fn events(&self) -> Vec<FlaggedEvent> {
        self.events.lock().expect("moderation sink lock").clone()
    }
}

impl ModerationSink for MemoryModerationSink {
    fn append_flagged_event(&self, event: FlaggedEvent) {
        self.events.lock().expect("moderation sink lock").push(event);
    }
}

/// File-backed sink writing one JSON object per line.
#[derive(Debug)]
pub struct FileModerationSink {
    file: Mutex<File>,
}

impl FileModerationSink {
    /// Open (or create) the log file for appending.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ModerationSink for FileModerationSink {
    fn append_flagged_event(&self, event: FlaggedEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(error) => {
                warn!(%error, "could not serialize flagged event");
                return;
            }
        };
        let mut file = self.file.lock().expect("moderation sink lock");
        if let Err(error) = writeln!(file, "{line}") {
            warn!(%error, "could not append flagged event");
        }
    }
}
