use serde::{Deserialize, Serialize};

use crate::ids::RoomId;
use crate::participant::ParticipantState;

/// An assembled support group.
///
/// The initiating participant is always at index 0 of `members`; the composer
/// adds exactly three companions behind them. Membership is fixed once the room
/// is handed to the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    id: RoomId,
    topic: String,
    members: Vec<ParticipantState>,
}

impl RoomState {
    /// Assemble a room from the initiating participant and their companions.
    ///
    /// The non-empty members invariant holds by construction: the initiator is
    /// always present.
    #[must_use]
    pub fn assemble(
        id: RoomId,
        initiator: ParticipantState,
        companions: Vec<ParticipantState>,
    ) -> Self {
        let topic = initiator.topic().to_string();
        let mut members = Vec::with_capacity(1 + companions.len());
        members.push(initiator);
        members.extend(companions);
        Self { id, topic, members }
    }

    #[must_use]
    pub fn id(&self) -> RoomId {
        self.id
    }

    /// The dominant topic, inherited from the initiating participant.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn members(&self) -> &[ParticipantState] {
        &self.members
    }

    /// The initiating ("current") participant.
    #[must_use]
    pub fn initiator(&self) -> &ParticipantState {
        &self.members[0]
    }

    /// Count of members that are overwhelmed and insistent on talking.
    /// A well-composed room never has more than one.
    #[must_use]
    pub fn overwhelmed_talker_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.is_overwhelmed_talker())
            .count()
    }
}
