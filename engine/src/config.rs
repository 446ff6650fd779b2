//! TOML configuration for session timing and safety scanning.
//!
//! Every section and field is optional; anything absent falls back to the
//! reference configuration. A host typically ships no config file at all.

use std::time::Duration;
use std::{fs, path::Path, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;

use hearth_types::{PhaseId, PhaseSchedule};

use crate::controller::SessionSettings;
use crate::lifecycle::NudgeConfig;
use crate::scanner::SafetyTaxonomy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config at {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HearthConfig {
    pub phases: Option<PhasesConfig>,
    pub nudges: Option<NudgesConfig>,
    pub safety: Option<SafetyConfig>,
}

/// Per-phase overrides; the four-phase sequence itself is not configurable.
#[derive(Debug, Default, Deserialize)]
pub struct PhasesConfig {
    pub arrival: Option<PhaseOverride>,
    pub sharing: Option<PhaseOverride>,
    pub reflection: Option<PhaseOverride>,
    pub close: Option<PhaseOverride>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PhaseOverride {
    pub seconds: Option<u64>,
    pub prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NudgesConfig {
    pub interval_seconds: Option<u64>,
    pub pool: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SafetyConfig {
    pub graphic_keywords: Option<Vec<String>>,
    pub self_harm_keywords: Option<Vec<String>>,
    pub despair_keywords: Option<Vec<String>>,
    pub graphic_message: Option<String>,
    pub self_harm_message: Option<String>,
    pub despair_message: Option<String>,
}

impl HearthConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Session timing with overrides applied over the reference values.
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        let mut schedule = PhaseSchedule::reference();
        if let Some(phases) = &self.phases {
            for (id, patch) in [
                (PhaseId::Arrival, &phases.arrival),
                (PhaseId::Sharing, &phases.sharing),
                (PhaseId::Reflection, &phases.reflection),
                (PhaseId::Close, &phases.close),
            ] {
                let Some(patch) = patch else { continue };
                if let Some(seconds) = patch.seconds {
                    schedule = schedule.with_duration(id, Duration::from_secs(seconds));
                }
                if let Some(prompt) = &patch.prompt {
                    schedule = schedule.with_system_prompt(id, prompt.clone());
                }
            }
        }

        let mut nudges = NudgeConfig::reference();
        if let Some(config) = &self.nudges {
            if let Some(seconds) = config.interval_seconds {
                nudges.interval = Duration::from_secs(seconds);
            }
            if let Some(pool) = &config.pool {
                nudges.pool.clone_from(pool);
            }
        }

        SessionSettings { schedule, nudges }
    }

    /// Scanner taxonomy with overrides applied over the reference lists.
    #[must_use]
    pub fn taxonomy(&self) -> SafetyTaxonomy {
        let mut taxonomy = SafetyTaxonomy::default();
        if let Some(safety) = &self.safety {
            if let Some(keywords) = &safety.graphic_keywords {
                taxonomy.graphic_keywords.clone_from(keywords);
            }
            if let Some(keywords) = &safety.self_harm_keywords {
                taxonomy.self_harm_keywords.clone_from(keywords);
            }
            if let Some(keywords) = &safety.despair_keywords {
                taxonomy.despair_keywords.clone_from(keywords);
            }
            if let Some(message) = &safety.graphic_message {
                taxonomy.graphic_message.clone_from(message);
            }
            if let Some(message) = &safety.self_harm_message {
                taxonomy.self_harm_message.clone_from(message);
            }
            if let Some(message) = &safety.despair_message {
                taxonomy.despair_message.clone_from(message);
            }
        }
        taxonomy
    }
}
