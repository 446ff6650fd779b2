//! Participant snapshot types.
//!
//! A `ParticipantState` is one person's self-reported emotional snapshot at
//! match time. Invariants are enforced at construction, so any value you hold
//! is structurally valid.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared willingness to speak during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Listen,
    ShareLittle,
    TalkLot,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidParticipantError {
    #[error("intensity {0} is out of range (expected 0-100)")]
    IntensityOutOfRange(u8),
    #[error("energy {0} is out of range (expected 0-100)")]
    EnergyOutOfRange(u8),
    #[error("needs must contain at least one tag")]
    EmptyNeeds,
}

/// One person's current emotional snapshot.
///
/// # Invariants
///
/// - `intensity` and `energy` are within 0-100
/// - `needs` holds at least one tag
///
/// Fields are private; [`ParticipantState::new`] validates once and
/// deserialization re-validates, so invalid snapshots are unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawParticipantState")]
pub struct ParticipantState {
    topic: String,
    intensity: u8,
    energy: u8,
    needs: BTreeSet<String>,
    readiness: Readiness,
}

/// Unvalidated mirror used as the serde entry point.
#[derive(Deserialize)]
struct RawParticipantState {
    topic: String,
    intensity: u8,
    energy: u8,
    needs: BTreeSet<String>,
    readiness: Readiness,
}

impl TryFrom<RawParticipantState> for ParticipantState {
    type Error = InvalidParticipantError;

    fn try_from(raw: RawParticipantState) -> Result<Self, Self::Error> {
        Self::new(raw.topic, raw.intensity, raw.energy, raw.needs, raw.readiness)
    }
}

impl ParticipantState {
    pub fn new(
        topic: impl Into<String>,
        intensity: u8,
        energy: u8,
        needs: BTreeSet<String>,
        readiness: Readiness,
    ) -> Result<Self, InvalidParticipantError> {
        if intensity > 100 {
            return Err(InvalidParticipantError::IntensityOutOfRange(intensity));
        }
        if energy > 100 {
            return Err(InvalidParticipantError::EnergyOutOfRange(energy));
        }
        if needs.is_empty() {
            return Err(InvalidParticipantError::EmptyNeeds);
        }
        Ok(Self {
            topic: topic.into(),
            intensity,
            energy,
            needs,
            readiness,
        })
    }

    /// Category tag the participant selected (free-form, e.g. "anxiety").
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Self-reported distress level, 0-100.
    #[must_use]
    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    /// Self-reported activation level, 0-100. Carried for future use; no
    /// composition rule reads it today.
    #[must_use]
    pub fn energy(&self) -> u8 {
        self.energy
    }

    #[must_use]
    pub fn needs(&self) -> &BTreeSet<String> {
        &self.needs
    }

    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// Whether this participant is both overwhelmed and insistent on talking.
    ///
    /// Rooms may hold at most one such member.
    #[must_use]
    pub fn is_overwhelmed_talker(&self) -> bool {
        self.intensity > 80 && self.readiness == Readiness::TalkLot
    }
}
