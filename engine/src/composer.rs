//! Constraint-based group assembly.
//!
//! Given one arriving participant, the composer fills out a four-member room
//! that satisfies the safety/balance rules, in priority order:
//!
//! 1. Stability balancing - a distressed arrival gets two stable listeners; a
//!    stable arrival can absorb one higher-need peer plus a mid-distress one.
//! 2. Overwhelmed-talker cap - at most one member may be both overwhelmed
//!    (`intensity > 80`) and insistent on talking (`talk_lot`).
//! 3. Topic inheritance - companions take the arrival's topic; topic defines
//!    the room, not the individual.
//!
//! Companions are synthesized stand-ins for a real waiting-pool query; their
//! unfixed attributes come from an injected [`RandomSource`].

use std::collections::BTreeSet;

use tracing::debug;

use hearth_types::{ParticipantState, Readiness, RoomId, RoomState};

use crate::random::{RandomSource, ThreadRandom};

/// Fixed vocabulary the composer draws companion needs from.
pub const NEED_VOCABULARY: [&str; 5] =
    ["listening", "understood", "sharing", "coping", "perspective"];

/// Intensity at or above which an arrival counts as distressed.
const DISTRESS_THRESHOLD: u8 = 50;

/// Assembles support-group rosters. Pure aside from the injected randomness;
/// no IO, no shared state.
#[derive(Debug)]
pub struct GroupComposer<R = ThreadRandom> {
    random: R,
}

impl GroupComposer<ThreadRandom> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            random: ThreadRandom,
        }
    }
}

impl Default for GroupComposer<ThreadRandom> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource> GroupComposer<R> {
    /// Build a composer over a specific randomness source.
    pub fn with_random(random: R) -> Self {
        Self { random }
    }

    /// Compose a four-member room around the arriving participant.
    ///
    /// Always produces exactly three companions; the arrival sits at index 0
    /// of the resulting roster. Invalid participants cannot reach this point -
    /// [`ParticipantState::new`] rejects them at construction.
    pub fn compose(&mut self, current: &ParticipantState) -> RoomState {
        let topic = current.topic();
        let mut companions = Vec::with_capacity(3);

        // Rule 1: stability balancing
        if current.intensity() >= DISTRESS_THRESHOLD {
            companions.push(self.companion(topic, 30, Readiness::Listen));
            companions.push(self.companion(topic, 40, Readiness::ShareLittle));
        } else {
            // A stable arrival can safely absorb one higher-need peer
            companions.push(self.companion(topic, 80, Readiness::ShareLittle));
            companions.push(self.companion(topic, 60, Readiness::TalkLot));
        }

        // Rule 2: overwhelmed-talker cap
        let has_overwhelmed_talker = current.is_overwhelmed_talker()
            || companions.iter().any(ParticipantState::is_overwhelmed_talker);
        if has_overwhelmed_talker {
            // Balancer instead of a second insistent talker
            companions.push(self.companion(topic, 45, Readiness::ShareLittle));
        } else {
            companions.push(self.companion(topic, 75, Readiness::Listen));
        }

        let room = RoomState::assemble(RoomId::generate(), current.clone(), companions);
        debug!(
            room_id = %room.id(),
            topic = room.topic(),
            members = room.members().len(),
            "composed room"
        );
        room
    }

    fn companion(&mut self, topic: &str, intensity: u8, readiness: Readiness) -> ParticipantState {
        let energy = (self.random.next_f64() * 100.0) as u8;
        let need = NEED_VOCABULARY[self.random.pick_index(NEED_VOCABULARY.len())];
        let needs: BTreeSet<String> = [need.to_string()].into_iter().collect();
        // intensity is a rule constant <= 80, energy < 100, needs is non-empty
        ParticipantState::new(topic, intensity, energy, needs, readiness)
            .expect("companion attributes satisfy participant invariants")
    }
}
