use futures::future::BoxFuture;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    metrics,
    overlay::{BrowserOverlay, OverlayUpdate, StatusOverlay},
    workflow::{
        step::{step_fn, stream_fn},
        EventStream, ExecutionContext, HaltReason, ProgressEvent, ProgressKind, StepFunction,
        WorkflowConfig, DONE_STATE, UNKNOWN_EVENT,
    },
    Error, Result,
};

/// Hard ceiling on steps per run, guarding against cycles with no exit.
pub const DEFAULT_MAX_STEPS: u32 = 1200;

/// Pause between steps so the driven page is not hammered.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub max_steps: u32,
    pub step_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            step_delay: DEFAULT_STEP_DELAY,
        }
    }
}

pub struct WorkflowEngine {
    config: WorkflowConfig,
    registry: HashMap<String, Arc<dyn StepFunction>>,
    current_state: String,
    context: ExecutionContext,
    step_count: u32,
    settings: EngineSettings,
    run_id: Uuid,
    overlay_shown: bool,
    progress_tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl WorkflowEngine {
    pub fn new(config: WorkflowConfig) -> Self {
        let current_state = config.meta.start_state.clone();
        Self {
            config,
            registry: HashMap::new(),
            current_state,
            context: ExecutionContext::new(),
            step_count: 0,
            settings: EngineSettings::default(),
            run_id: Uuid::new_v4(),
            overlay_shown: false,
            progress_tx: None,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(WorkflowConfig::from_path(path)?))
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.settings.max_steps = max_steps;
        self
    }

    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.settings.step_delay = step_delay;
        self
    }

    /// Register (or replace) a step function. Functions are resolved lazily when their state
    /// is reached, so registration may happen any time before that.
    pub fn register(&mut self, name: impl Into<String>, function: impl StepFunction + 'static) {
        self.registry.insert(name.into(), Arc::new(function));
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: for<'a> Fn(&'a mut ExecutionContext) -> BoxFuture<'a, anyhow::Result<String>>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, step_fn(f));
    }

    pub fn register_stream<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: for<'a> Fn(&'a mut ExecutionContext) -> EventStream<'a> + Send + Sync + 'static,
    {
        self.register(name, stream_fn(f));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    pub fn set_context(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.context.set(key, value);
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Live context, for seeding before `run` and inspecting afterwards.
    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Receive progress records for this engine. Only the latest subscriber is fed.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ProgressEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.progress_tx = Some(tx);
        rx
    }

    /// Run one step and return the event that selects its transition.
    ///
    /// The first event the step yields races the state's timeout. If the timeout wins the
    /// step's stream is dropped, cancelling its in-flight work, and the state's timeout event
    /// is returned instead.
    pub async fn execute_step(&mut self, state_name: &str) -> Result<String> {
        let def = self
            .config
            .state(state_name)
            .cloned()
            .ok_or_else(|| Error::UnknownState(state_name.to_string()))?;

        let function = self
            .registry
            .get(&def.function_name)
            .cloned()
            .ok_or_else(|| Error::UnregisteredFunction {
                state: state_name.to_string(),
                function: def.function_name.clone(),
            })?;

        debug!(
            "Executing step {} '{}' ({}), timeout {:?}",
            def.sequence_index,
            state_name,
            def.function_name,
            def.timeout()
        );
        self.emit(
            ProgressEvent::new(self.run_id, ProgressKind::StepStarted)
                .state(state_name)
                .function(&def.function_name),
        );

        let outcome = {
            let mut events = function.call(&mut self.context);
            timeout(def.timeout(), events.next()).await
        };

        let event = match outcome {
            Ok(Some(Ok(event))) if !event.is_empty() => event,
            Ok(Some(Ok(_))) | Ok(None) => {
                warn!(
                    "Step '{}' ({}) finished without an event",
                    state_name, def.function_name
                );
                UNKNOWN_EVENT.to_string()
            }
            Ok(Some(Err(source))) => {
                error!("Error in step '{}': {:#}", state_name, source);
                return Err(Error::Step {
                    state: state_name.to_string(),
                    source,
                });
            }
            Err(_) => {
                warn!(
                    "Step '{}' timed out after {:?}, using event '{}'",
                    state_name,
                    def.timeout(),
                    def.timeout_event
                );
                metrics::record_timeout();
                self.emit(
                    ProgressEvent::new(self.run_id, ProgressKind::StepTimedOut)
                        .state(state_name)
                        .function(&def.function_name)
                        .event(&def.timeout_event),
                );
                def.timeout_event.clone()
            }
        };

        metrics::record_step();
        info!("Step {} [{}] → {}", def.sequence_index, def.function_name, event);
        self.emit(
            ProgressEvent::new(self.run_id, ProgressKind::StepFinished)
                .state(state_name)
                .function(&def.function_name)
                .event(&event),
        );

        self.notify_overlay(OverlayUpdate::running(
            def.sequence_index,
            &def.function_name,
            &event,
        ))
        .await;

        Ok(event)
    }

    /// Drive the workflow from the start state until it reaches `done`, hits an event with
    /// no transition, or exhausts the step ceiling. Every run starts over with a fresh step
    /// count. Step errors propagate and leave `current_state` at the failing step.
    pub async fn run(&mut self) -> Result<HaltReason> {
        info!("Starting workflow: {}", self.config.meta.title);
        self.current_state = self.config.meta.start_state.clone();
        self.step_count = 0;
        self.emit(
            ProgressEvent::new(self.run_id, ProgressKind::RunStarted)
                .state(&self.current_state)
                .message(self.config.meta.title.clone()),
        );
        let description = self.config.meta.description.clone();
        self.notify_overlay(OverlayUpdate::starting(&description)).await;

        let mut halt = HaltReason::Completed;

        while self.current_state != DONE_STATE {
            if self.step_count >= self.settings.max_steps {
                warn!(
                    "Maximum step count ({}) reached, stopping workflow",
                    self.settings.max_steps
                );
                halt = HaltReason::StepLimit {
                    steps: self.step_count,
                };
                break;
            }

            self.step_count += 1;
            let state = self.current_state.clone();

            let event = match self.execute_step(&state).await {
                Ok(event) => event,
                Err(e) => {
                    metrics::record_halt("error");
                    self.emit(
                        ProgressEvent::new(self.run_id, ProgressKind::RunHalted)
                            .state(&state)
                            .message(e.to_string()),
                    );
                    return Err(e);
                }
            };

            let next = self
                .config
                .state(&state)
                .and_then(|def| def.next_state(&event))
                .map(str::to_string);

            match next {
                Some(next) => {
                    info!("Transitioning from '{}' to '{}' on event '{}'", state, next, event);
                    self.emit(
                        ProgressEvent::new(self.run_id, ProgressKind::Transition)
                            .state(&next)
                            .event(&event)
                            .message(format!("{} -> {}", state, next)),
                    );
                    self.current_state = next;
                }
                None => {
                    warn!("No transition found for event '{}' in step '{}'", event, state);
                    halt = HaltReason::NoTransition { state, event };
                    break;
                }
            }

            if self.current_state != DONE_STATE && self.step_count < self.settings.max_steps {
                tokio::time::sleep(self.settings.step_delay).await;
            }
        }

        metrics::record_halt(halt.label());
        self.emit(
            ProgressEvent::new(self.run_id, ProgressKind::RunHalted)
                .state(&self.current_state)
                .message(halt.to_string()),
        );
        debug!("Final context: {}", self.context.to_json());
        let steps = self.step_count;
        self.notify_overlay(OverlayUpdate::finished(&halt.to_string(), steps)).await;

        info!(
            "Workflow '{}' stopped after {} steps: {}",
            self.config.meta.title, steps, halt
        );
        Ok(halt)
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(event);
        }
    }

    /// Show or refresh the status overlay. A driver without an overlay gets a browser overlay
    /// attached the first time one is needed. Failures are logged only.
    async fn notify_overlay(&mut self, update: OverlayUpdate) {
        let overlay = if let Some(overlay) = self.context.overlay.clone() {
            overlay
        } else if let Some(driver) = self.context.driver.clone() {
            match BrowserOverlay::new(driver) {
                Ok(overlay) => {
                    let overlay: Arc<dyn StatusOverlay> = Arc::new(overlay);
                    self.context.overlay = Some(overlay.clone());
                    self.overlay_shown = false;
                    overlay
                }
                Err(e) => {
                    warn!("Failed to create status overlay: {}", e);
                    return;
                }
            }
        } else {
            return;
        };

        if self.overlay_shown {
            if let Err(e) = overlay.update(&update).await {
                warn!("Overlay update failed: {:#}", e);
            }
            return;
        }

        match overlay.show(&update).await {
            Ok(()) => self.overlay_shown = true,
            Err(e) => {
                warn!("Failed to show status overlay: {:#}", e);
                self.context.overlay = None;
            }
        }
    }
}
