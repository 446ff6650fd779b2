//! Core engine for Hearth - group composition and room lifecycle orchestration.
//!
//! Three cooperating pieces:
//! - [`GroupComposer`] assembles a four-member support room around one
//!   arriving participant, under hard safety/balance rules.
//! - [`SafetyScanner`] classifies message text into a severity tier by keyword
//!   containment.
//! - [`RoomLifecycleController`] walks an assembled room through its timed
//!   phases and gates every message through the scanner; [`RoomRuntime`] is
//!   its async driver.
//!
//! Rooms are fully independent of each other; the only boundaries are the
//! injected [`ModerationSink`], [`RandomSource`], and tokio's clock.

// Re-export the domain vocabulary for downstream crates
pub use hearth_types::{
    EmptyIdError, FlagKind, FlaggedEvent, InvalidParticipantError, ParticipantId, ParticipantState,
    PhaseConfig, PhaseId, PhaseSchedule, Readiness, RoomId, RoomState, SafetyFlag,
    SafetyScanResult, Severity,
};

mod composer;
mod config;
mod controller;
mod lifecycle;
mod moderation;
mod random;
mod runtime;
mod scanner;

pub use composer::{GroupComposer, NEED_VOCABULARY};
pub use config::{
    ConfigError, HearthConfig, NudgesConfig, PhaseOverride, PhasesConfig, SafetyConfig,
};
pub use controller::{
    MessageOutcome, RoomEvent, RoomLifecycleController, Sender, SessionSettings, TranscriptEntry,
};
pub use lifecycle::{Emission, LifecycleState, NudgeConfig};
pub use moderation::{FileModerationSink, MemoryModerationSink, ModerationSink};
pub use random::{RandomSource, SequenceRandom, ThreadRandom};
pub use runtime::{RoomClosedError, RoomHandle, RoomRuntime};
pub use scanner::{SafetyScanner, SafetyTaxonomy, TaxonomyError};

#[cfg(test)]
mod tests;
