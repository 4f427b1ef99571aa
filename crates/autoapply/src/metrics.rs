use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        registry
            .register(Box::new(STEPS_EXECUTED_TOTAL.clone()))
            .ok();
        registry
            .register(Box::new(STEP_TIMEOUTS_TOTAL.clone()))
            .ok();
        registry
            .register(Box::new(RUNS_HALTED_TOTAL.clone()))
            .ok();
        registry
    };
    pub static ref STEPS_EXECUTED_TOTAL: IntCounter = IntCounter::new(
        "autoapply_steps_executed_total",
        "Total number of workflow steps executed."
    )
    .expect("valid metric definition");
    pub static ref STEP_TIMEOUTS_TOTAL: IntCounter = IntCounter::new(
        "autoapply_step_timeouts_total",
        "Total number of workflow steps that hit their timeout."
    )
    .expect("valid metric definition");
    pub static ref RUNS_HALTED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "autoapply_runs_halted_total",
            "Total number of workflow runs by halt reason."
        ),
        &["reason"]
    )
    .expect("valid metric definition");
}

pub fn record_step() {
    STEPS_EXECUTED_TOTAL.inc();
}

pub fn record_timeout() {
    STEP_TIMEOUTS_TOTAL.inc();
}

pub fn record_halt(reason: &str) {
    RUNS_HALTED_TOTAL.with_label_values(&[reason]).inc();
}

/// Render all metrics in the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
