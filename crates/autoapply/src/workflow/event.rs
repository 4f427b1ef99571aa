use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    RunStarted,
    StepStarted,
    StepFinished,
    StepTimedOut,
    Transition,
    RunHalted,
}

/// Observational record of what the engine is doing. Nothing depends on these being delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub run_id: Uuid,
    pub kind: ProgressKind,
    pub timestamp: DateTime<Utc>,
    pub state: Option<String>,
    pub function: Option<String>,
    pub event: Option<String>,
    pub message: Option<String>,
}

impl ProgressEvent {
    pub fn new(run_id: Uuid, kind: ProgressKind) -> Self {
        Self {
            run_id,
            kind,
            timestamp: Utc::now(),
            state: None,
            function: None,
            event: None,
            message: None,
        }
    }

    pub fn state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }

    pub fn function(mut self, function: &str) -> Self {
        self.function = Some(function.to_string());
        self
    }

    pub fn event(mut self, event: &str) -> Self {
        self.event = Some(event.to_string());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
