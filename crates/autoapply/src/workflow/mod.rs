//! Step-transition workflow engine.
//!
//! A workflow is a graph of named steps loaded from YAML. Each step is bound to a registered
//! step function; the first event the function yields selects the outgoing transition.

pub mod config;
pub mod context;
pub mod engine;
pub mod event;
pub mod state;
pub mod step;

pub use config::{ConfigIssue, StateDefinition, WorkflowConfig, WorkflowMeta};
pub use context::ExecutionContext;
pub use engine::{EngineSettings, WorkflowEngine, DEFAULT_MAX_STEPS, DEFAULT_STEP_DELAY};
pub use event::{ProgressEvent, ProgressKind};
pub use state::HaltReason;
pub use step::{stream_fn, step_fn, EventStream, StepFunction, UNKNOWN_EVENT};

/// Sentinel state that ends a run successfully.
pub const DONE_STATE: &str = "done";
