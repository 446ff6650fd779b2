//! Core domain types for Hearth.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod ids;
mod participant;
mod phase;
mod room;
mod safety;

pub use ids::{EmptyIdError, ParticipantId, RoomId};
pub use participant::{InvalidParticipantError, ParticipantState, Readiness};
pub use phase::{PhaseConfig, PhaseId, PhaseSchedule};
pub use room::RoomState;
pub use safety::{FlagKind, FlaggedEvent, SafetyFlag, SafetyScanResult, Severity};
