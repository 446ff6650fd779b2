//! Safety-scan outcome types.
//!
//! A scan either comes back clear or carries a flag. The original UI modeled
//! this as a `flagged` boolean plus nullable fields; here the enum structure
//! makes "resource message and trigger word are present iff flagged" hold by
//! construction.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::ids::RoomId;

/// Severity tier of a safety flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Moderate,
    High,
}

/// What kind of content tripped the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Graphic detail that should stay out of a shared room.
    Graphic,
    /// Self-harm language; escalates to crisis resources.
    SelfHarm,
    /// Despair language; supported but not suppressed.
    Despair,
}

impl FlagKind {
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            FlagKind::SelfHarm => Severity::High,
            FlagKind::Graphic | FlagKind::Despair => Severity::Moderate,
        }
    }
}

/// Details of a tripped scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFlag {
    pub kind: FlagKind,
    /// The literal keyword substring that caused the flag.
    pub trigger_word: String,
    /// Human-readable guidance shown to the poster.
    pub resource_message: String,
}

/// Outcome of scanning one message. Computed fresh per message, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SafetyScanResult {
    Clear,
    Flagged(SafetyFlag),
}

impl SafetyScanResult {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            SafetyScanResult::Clear => Severity::None,
            SafetyScanResult::Flagged(flag) => flag.kind.severity(),
        }
    }

    #[must_use]
    pub fn is_flagged(&self) -> bool {
        matches!(self, SafetyScanResult::Flagged(_))
    }

    #[must_use]
    pub fn flag(&self) -> Option<&SafetyFlag> {
        match self {
            SafetyScanResult::Clear => None,
            SafetyScanResult::Flagged(flag) => Some(flag),
        }
    }
}

/// Record appended to the moderation sink when a high-severity flag occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedEvent {
    pub room_id: RoomId,
    pub timestamp: SystemTime,
    pub trigger_word: String,
}
