use autoapply::{
    workflow::{HaltReason, WorkflowConfig, WorkflowEngine, DONE_STATE},
    Error,
};
use futures::{stream, StreamExt};
use std::time::Duration;

const SINGLE_STEP: &str = r#"
workflow_meta:
  title: Single step
  description: one state that finishes
  start_step: a
steps_config:
  a:
    step: 1
    func: f
    timeout: 5
    on_timeout_event: timed_out
    transitions:
      go: done
      timed_out: done
"#;

const CYCLE: &str = r#"
workflow_meta:
  title: Cycle
  description: never reaches done
  start_step: a
steps_config:
  a:
    step: 1
    func: ping
    timeout: 5
    transitions:
      next: b
  b:
    step: 2
    func: pong
    timeout: 5
    transitions:
      next: a
"#;

fn engine(yaml: &str) -> WorkflowEngine {
    WorkflowEngine::new(WorkflowConfig::from_yaml_str(yaml).unwrap())
        .with_step_delay(Duration::ZERO)
}

#[tokio::test]
async fn immediate_event_completes_in_one_step() {
    let mut engine = engine(SINGLE_STEP);
    engine.register_fn("f", |_ctx| Box::pin(async { Ok("go".to_string()) }));

    let halt = engine.run().await.unwrap();

    assert_eq!(halt, HaltReason::Completed);
    assert_eq!(engine.step_count(), 1);
    assert_eq!(engine.current_state(), DONE_STATE);
}

#[tokio::test(start_paused = true)]
async fn silent_step_falls_back_to_timeout_event() {
    let mut engine = engine(SINGLE_STEP);
    engine.register_fn("f", |_ctx| Box::pin(futures::future::pending::<anyhow::Result<String>>()));

    assert_eq!(engine.execute_step("a").await.unwrap(), "timed_out");

    let halt = engine.run().await.unwrap();
    assert_eq!(halt, HaltReason::Completed);
    assert_eq!(engine.current_state(), DONE_STATE);
}

#[tokio::test(start_paused = true)]
async fn late_event_loses_to_timeout() {
    let mut engine = engine(SINGLE_STEP);
    engine.register_fn("f", |_ctx| {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(6)).await;
            Ok("go".to_string())
        })
    });

    assert_eq!(engine.execute_step("a").await.unwrap(), "timed_out");
}

#[tokio::test]
async fn only_first_yield_drives_transition() {
    let mut engine = engine(SINGLE_STEP);
    engine.register_stream("f", |ctx| {
        stream::iter(["go", "weird", "weirder"])
            .map(move |event| {
                ctx.increment("yields");
                Ok::<_, anyhow::Error>(event.to_string())
            })
            .boxed()
    });

    let halt = engine.run().await.unwrap();

    assert_eq!(halt, HaltReason::Completed);
    assert_eq!(engine.step_count(), 1);
    assert_eq!(engine.context().counter("yields"), 1);
}

#[tokio::test]
async fn missing_transition_is_a_soft_stop() {
    let mut engine = engine(SINGLE_STEP);
    engine.register_fn("f", |_ctx| Box::pin(async { Ok("weird".to_string()) }));

    let halt = engine.run().await.unwrap();

    assert_eq!(
        halt,
        HaltReason::NoTransition {
            state: "a".to_string(),
            event: "weird".to_string(),
        }
    );
    assert_eq!(engine.current_state(), "a");
    assert_eq!(engine.step_count(), 1);
}

#[tokio::test]
async fn cycle_stops_at_step_ceiling() {
    let mut engine = engine(CYCLE).with_max_steps(3);
    engine.register_fn("ping", |ctx| {
        Box::pin(async move {
            ctx.increment("ping");
            Ok("next".to_string())
        })
    });
    engine.register_fn("pong", |ctx| {
        Box::pin(async move {
            ctx.increment("pong");
            Ok("next".to_string())
        })
    });

    let halt = engine.run().await.unwrap();

    assert_eq!(halt, HaltReason::StepLimit { steps: 3 });
    assert_eq!(engine.step_count(), 3);
    assert_eq!(engine.context().counter("ping"), 2);
    assert_eq!(engine.context().counter("pong"), 1);
    assert_eq!(engine.current_state(), "b");
}

#[tokio::test]
async fn step_error_rejects_run() {
    let mut engine = engine(SINGLE_STEP);
    engine.register_fn("f", |_ctx| Box::pin(async { Err(anyhow::anyhow!("boom")) }));

    let err = engine.run().await.unwrap_err();

    match &err {
        Error::Step { state, source } => {
            assert_eq!(state, "a");
            assert_eq!(source.to_string(), "boom");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(engine.current_state(), "a");
}

#[tokio::test]
async fn seeded_context_reaches_first_step() {
    let mut engine = engine(SINGLE_STEP);
    engine.set_context("keywords", "engineer");
    engine.register_fn("f", |ctx| {
        Box::pin(async move {
            let event = if ctx.get_str("keywords") == Some("engineer") {
                "go"
            } else {
                "weird"
            };
            let keywords = ctx.get_str("keywords").unwrap_or_default().to_string();
            ctx.set("searched_for", keywords);
            Ok(event.to_string())
        })
    });

    assert_eq!(engine.run().await.unwrap(), HaltReason::Completed);
    assert_eq!(engine.context().get_str("searched_for"), Some("engineer"));
}

#[tokio::test]
async fn retry_is_a_graph_construct() {
    let mut engine = engine(
        r#"
workflow_meta:
  title: Retry
  start_step: submit
steps_config:
  submit:
    step: 1
    func: submit
    timeout: 5
    transitions:
      failed: submit
      submitted: done
"#,
    );
    engine.register_fn("submit", |ctx| {
        Box::pin(async move {
            let attempt = ctx.increment("attempts");
            let event = if attempt < 3 { "failed" } else { "submitted" };
            Ok(event.to_string())
        })
    });

    assert_eq!(engine.run().await.unwrap(), HaltReason::Completed);
    assert_eq!(engine.step_count(), 3);
}

const TWO_STEP: &str = r#"
workflow_meta:
  title: Two step
  description: search then apply
  start_step: a
steps_config:
  a:
    step: 1
    func: fa
    timeout: 5
    transitions:
      go: b
  b:
    step: 2
    func: fb
    timeout: 5
    transitions:
      go: done
"#;

#[tokio::test]
async fn rerun_starts_from_start_state() {
    let mut engine = engine(TWO_STEP);
    engine.register_fn("fa", |ctx| {
        Box::pin(async move {
            ctx.increment("a");
            Ok("go".to_string())
        })
    });
    engine.register_fn("fb", |ctx| {
        Box::pin(async move {
            if ctx.increment("b") == 1 {
                return Err(anyhow::anyhow!("page not ready"));
            }
            Ok("go".to_string())
        })
    });

    assert!(engine.run().await.is_err());
    assert_eq!(engine.current_state(), "b");
    assert_eq!(engine.step_count(), 2);

    let halt = engine.run().await.unwrap();

    assert_eq!(halt, HaltReason::Completed);
    assert_eq!(engine.context().counter("a"), 2);
    assert_eq!(engine.context().counter("b"), 2);
    assert_eq!(engine.step_count(), 2);
}

#[tokio::test]
async fn rerun_after_step_limit_executes_again() {
    let mut engine = engine(CYCLE).with_max_steps(3);
    engine.register_fn("ping", |_ctx| Box::pin(async { Ok("next".to_string()) }));
    engine.register_fn("pong", |_ctx| Box::pin(async { Ok("next".to_string()) }));

    assert_eq!(engine.run().await.unwrap(), HaltReason::StepLimit { steps: 3 });
    assert_eq!(engine.run().await.unwrap(), HaltReason::StepLimit { steps: 3 });
    assert_eq!(engine.current_state(), "b");
}

#[tokio::test(start_paused = true)]
async fn huge_timeout_does_not_fire_early() {
    let mut engine = engine(
        r#"
workflow_meta:
  title: Slow page
  start_step: a
steps_config:
  a:
    func: f
    timeout: 1.0e30
    on_timeout_event: timed_out
    transitions:
      go: done
      timed_out: done
"#,
    );
    engine.register_fn("f", |_ctx| {
        Box::pin(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok("go".to_string())
        })
    });

    assert_eq!(engine.execute_step("a").await.unwrap(), "go");
}

#[tokio::test(start_paused = true)]
async fn steps_are_paced_except_into_done() {
    let mut engine = WorkflowEngine::new(WorkflowConfig::from_yaml_str(TWO_STEP).unwrap());
    engine.register_fn("fa", |_ctx| Box::pin(async { Ok("go".to_string()) }));
    engine.register_fn("fb", |_ctx| Box::pin(async { Ok("go".to_string()) }));

    let started = tokio::time::Instant::now();
    assert_eq!(engine.run().await.unwrap(), HaltReason::Completed);

    assert_eq!(started.elapsed(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn no_pause_after_last_allowed_step() {
    let mut engine =
        WorkflowEngine::new(WorkflowConfig::from_yaml_str(CYCLE).unwrap()).with_max_steps(3);
    engine.register_fn("ping", |_ctx| Box::pin(async { Ok("next".to_string()) }));
    engine.register_fn("pong", |_ctx| Box::pin(async { Ok("next".to_string()) }));

    let started = tokio::time::Instant::now();
    assert_eq!(engine.run().await.unwrap(), HaltReason::StepLimit { steps: 3 });

    assert_eq!(started.elapsed(), Duration::from_millis(200));
}

#[tokio::test]
async fn dangling_target_fails_when_reached() {
    let mut engine = engine(
        r#"
workflow_meta:
  title: Dangling
  start_step: a
steps_config:
  a:
    func: f
    timeout: 5
    transitions:
      go: nowhere
"#,
    );
    engine.register_fn("f", |_ctx| Box::pin(async { Ok("go".to_string()) }));

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, Error::UnknownState(ref s) if s == "nowhere"));
    assert_eq!(engine.current_state(), "nowhere");
}
