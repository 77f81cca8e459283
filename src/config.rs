//! Machine configuration.
//!
//! Configuration is plain data: it can be built in code or deserialized from
//! JSON. Validation uses Stillwater's `Validation` so that every problem is
//! reported at once instead of one per attempt.

use crate::trace::TraceLevel;
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Passes allowed per resolution before it is declared divergent.
pub const DEFAULT_MAX_PASSES: usize = 100;

/// Remaining passes at which the machine raises its trace level.
pub const DEFAULT_ESCALATION_WINDOW: usize = 4;

/// Problems with a [`MachineConfig`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("max_passes must be at least 1")]
    ZeroPasses,

    #[error("escalation_window ({window}) exceeds max_passes ({max_passes})")]
    WindowTooLarge { window: usize, max_passes: usize },

    #[error("name must not be empty when given")]
    EmptyName,

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Settings for one state machine.
///
/// # Example
///
/// ```rust
/// use nested_hsm::config::MachineConfig;
/// use nested_hsm::trace::TraceLevel;
///
/// let config = MachineConfig::from_json(r#"{ "name": "kid", "trace_level": "basic" }"#).unwrap();
/// assert_eq!(config.trace_level, TraceLevel::Basic);
/// assert_eq!(config.max_passes, 100);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Label used in trace output
    pub name: Option<String>,

    /// Which trace events reach the tracer
    pub trace_level: TraceLevel,

    /// Resolution passes allowed per update
    pub max_passes: usize,

    /// How many passes before the bound the trace level is raised to
    /// `Diagnostic`
    pub escalation_window: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: None,
            trace_level: TraceLevel::None,
            max_passes: DEFAULT_MAX_PASSES,
            escalation_window: DEFAULT_ESCALATION_WINDOW,
        }
    }
}

impl MachineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every rule, accumulating all failures.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigError>>> = Vec::new();

        checks.push(if self.max_passes == 0 {
            Validation::fail(ConfigError::ZeroPasses)
        } else {
            Validation::success(())
        });

        checks.push(if self.escalation_window > self.max_passes {
            Validation::fail(ConfigError::WindowTooLarge {
                window: self.escalation_window,
                max_passes: self.max_passes,
            })
        } else {
            Validation::success(())
        });

        if let Some(name) = &self.name {
            checks.push(if name.trim().is_empty() {
                Validation::fail(ConfigError::EmptyName)
            } else {
                Validation::success(())
            });
        }

        Validation::all_vec(checks).map(|_| ())
    }
}
