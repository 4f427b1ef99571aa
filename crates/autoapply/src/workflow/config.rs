use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::{workflow::DONE_STATE, Error, Result};

/// Declarative step graph, parsed once and never mutated.
///
/// Loading performs no semantic validation: dangling transition targets and unregistered
/// function names only surface when the engine reaches them. Use [`WorkflowConfig::lint`]
/// for an explicit offline check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(rename = "workflow_meta")]
    pub meta: WorkflowMeta,

    #[serde(rename = "steps_config", default)]
    pub states: HashMap<String, StateDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowMeta {
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "start_step")]
    pub start_state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDefinition {
    /// Display ordinal, not used for control flow. Fractional values slot a step between
    /// two others.
    #[serde(rename = "step", default)]
    pub sequence_index: f64,

    /// Name of the registered step function
    #[serde(rename = "func")]
    pub function_name: String,

    /// Event name -> next state (or `done`)
    #[serde(default)]
    pub transitions: HashMap<String, String>,

    /// Seconds before the engine synthesizes `timeout_event`
    #[serde(rename = "timeout")]
    pub timeout_seconds: f64,

    #[serde(rename = "on_timeout_event", default = "default_timeout_event")]
    pub timeout_event: String,
}

fn default_timeout_event() -> String {
    "timeout".to_string()
}

impl StateDefinition {
    /// Non-positive and NaN timeouts collapse to zero, which fires immediately. Values too
    /// large for a `Duration` (including infinity) saturate to `Duration::MAX`.
    pub fn timeout(&self) -> Duration {
        if self.timeout_seconds.is_nan() || self.timeout_seconds <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.timeout_seconds).unwrap_or(Duration::MAX)
    }

    pub fn next_state(&self, event: &str) -> Option<&str> {
        self.transitions.get(event).map(String::as_str)
    }
}

/// Problems found by [`WorkflowConfig::lint`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    MissingStartState(String),
    DanglingTransition {
        state: String,
        event: String,
        target: String,
    },
    InvalidTimeout {
        state: String,
        timeout: f64,
    },
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::MissingStartState(name) => {
                write!(f, "start step '{}' is not defined in steps_config", name)
            }
            ConfigIssue::DanglingTransition { state, event, target } => write!(
                f,
                "step '{}' transitions on '{}' to undefined step '{}'",
                state, event, target
            ),
            ConfigIssue::InvalidTimeout { state, timeout } => {
                write!(f, "step '{}' has non-positive timeout {}", state, timeout)
            }
        }
    }
}

impl WorkflowConfig {
    /// Load a workflow document. `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| Error::ConfigParse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigParse {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    pub fn state(&self, name: &str) -> Option<&StateDefinition> {
        self.states.get(name)
    }

    /// States sorted by their display ordinal, ties broken by name.
    pub fn ordered_states(&self) -> Vec<(&str, &StateDefinition)> {
        let mut states: Vec<_> = self
            .states
            .iter()
            .map(|(name, def)| (name.as_str(), def))
            .collect();
        states.sort_by(|a, b| {
            a.1.sequence_index
                .total_cmp(&b.1.sequence_index)
                .then_with(|| a.0.cmp(b.0))
        });
        states
    }

    pub fn lint(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !self.states.contains_key(&self.meta.start_state) {
            issues.push(ConfigIssue::MissingStartState(self.meta.start_state.clone()));
        }

        for (name, def) in self.ordered_states() {
            if !(def.timeout_seconds > 0.0) {
                issues.push(ConfigIssue::InvalidTimeout {
                    state: name.to_string(),
                    timeout: def.timeout_seconds,
                });
            }

            let mut transitions: Vec<_> = def.transitions.iter().collect();
            transitions.sort();
            for (event, target) in transitions {
                if target != DONE_STATE && !self.states.contains_key(target) {
                    issues.push(ConfigIssue::DanglingTransition {
                        state: name.to_string(),
                        event: event.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        issues
    }
}
