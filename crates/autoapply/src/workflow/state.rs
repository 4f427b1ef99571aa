use std::fmt;

/// Why a run stopped without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// Reached the `done` state.
    Completed,
    /// The produced event has no entry in the state's transition table.
    NoTransition { state: String, event: String },
    /// The step ceiling was reached before `done`.
    StepLimit { steps: u32 },
}

impl HaltReason {
    pub fn is_completed(&self) -> bool {
        matches!(self, HaltReason::Completed)
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            HaltReason::Completed => "completed",
            HaltReason::NoTransition { .. } => "no_transition",
            HaltReason::StepLimit { .. } => "step_limit",
        }
    }
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::Completed => write!(f, "Completed"),
            HaltReason::NoTransition { state, event } => {
                write!(f, "No transition for event '{}' in step '{}'", event, state)
            }
            HaltReason::StepLimit { steps } => write!(f, "Step limit reached after {} steps", steps),
        }
    }
}
