//! Phased-session configuration.
//!
//! A room's guided conversation always moves through the same four phases in
//! order. Durations and prompts are configurable; the sequence is not.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One stage of the fixed room lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseId {
    Arrival,
    Sharing,
    Reflection,
    Close,
}

impl PhaseId {
    /// Canonical order. The lifecycle never branches, skips, or repeats.
    pub const SEQUENCE: [PhaseId; 4] = [
        PhaseId::Arrival,
        PhaseId::Sharing,
        PhaseId::Reflection,
        PhaseId::Close,
    ];

    /// The phase that follows this one, or `None` from the terminal phase.
    #[must_use]
    pub fn next(self) -> Option<PhaseId> {
        match self {
            PhaseId::Arrival => Some(PhaseId::Sharing),
            PhaseId::Sharing => Some(PhaseId::Reflection),
            PhaseId::Reflection => Some(PhaseId::Close),
            PhaseId::Close => None,
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PhaseId::Arrival => "ARRIVAL",
            PhaseId::Sharing => "SHARING",
            PhaseId::Reflection => "REFLECTION",
            PhaseId::Close => "CLOSE",
        };
        f.write_str(label)
    }
}

/// Configuration for a single phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseConfig {
    id: PhaseId,
    name: String,
    duration: Duration,
    system_prompt: String,
}

impl PhaseConfig {
    #[must_use]
    pub fn new(
        id: PhaseId,
        name: impl Into<String>,
        duration: Duration,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            duration,
            system_prompt: system_prompt.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> PhaseId {
        self.id
    }

    /// Display label; not behaviorally significant.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Text emitted once when the phase becomes active.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

/// The four phase configs in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSchedule {
    phases: [PhaseConfig; 4],
}

impl PhaseSchedule {
    /// The reference schedule: ARRIVAL=30s, SHARING=120s, REFLECTION=60s,
    /// CLOSE=30s, with the standard facilitation prompts.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            phases: [
                PhaseConfig::new(
                    PhaseId::Arrival,
                    "Arrival phase",
                    Duration::from_secs(30),
                    "Welcome. How is everyone feeling right now? A single word or emoji is fine.",
                ),
                PhaseConfig::new(
                    PhaseId::Sharing,
                    "Sharing",
                    Duration::from_secs(120),
                    "We are now moving into sharing time. Remember: no advice unless asked. Who would like to share first?",
                ),
                PhaseConfig::new(
                    PhaseId::Reflection,
                    "Reflection",
                    Duration::from_secs(60),
                    "Let's pause and reflect. What resonated with you today? Did anything help you feel less alone?",
                ),
                PhaseConfig::new(
                    PhaseId::Close,
                    "Closing",
                    Duration::from_secs(30),
                    "Our time is coming to an end. Take a moment to notice your breath. Thank you for showing up for each other.",
                ),
            ],
        }
    }

    #[must_use]
    pub fn get(&self, id: PhaseId) -> &PhaseConfig {
        // SEQUENCE and the phases array share one ordering
        let index = match id {
            PhaseId::Arrival => 0,
            PhaseId::Sharing => 1,
            PhaseId::Reflection => 2,
            PhaseId::Close => 3,
        };
        &self.phases[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhaseConfig> {
        self.phases.iter()
    }

    /// Override one phase's duration, keeping its prompt and label.
    #[must_use]
    pub fn with_duration(mut self, id: PhaseId, duration: Duration) -> Self {
        for phase in &mut self.phases {
            if phase.id == id {
                phase.duration = duration;
            }
        }
        self
    }

    /// Override one phase's system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, id: PhaseId, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        for phase in &mut self.phases {
            if phase.id == id {
                phase.system_prompt.clone_from(&prompt);
            }
        }
        self
    }
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        Self::reference()
    }
}
