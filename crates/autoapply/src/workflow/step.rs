//! Step function contract.
//!
//! A step function is the Rust shape of an async generator: it receives the shared context
//! and returns a lazy stream of event names. The engine only ever pulls the first event.

use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt};

use crate::workflow::ExecutionContext;

/// Event emitted when a step's stream ends without yielding anything.
pub const UNKNOWN_EVENT: &str = "unknown";

pub type EventStream<'a> = BoxStream<'a, anyhow::Result<String>>;

pub trait StepFunction: Send + Sync {
    /// Start the step. Work happens as the returned stream is polled; dropping the stream
    /// cancels whatever is still in flight.
    fn call<'a>(&'a self, ctx: &'a mut ExecutionContext) -> EventStream<'a>;
}

/// Step backed by a closure that resolves to a single event.
pub struct FnStep<F>(F);

impl<F> StepFunction for FnStep<F>
where
    F: for<'a> Fn(&'a mut ExecutionContext) -> BoxFuture<'a, anyhow::Result<String>> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut ExecutionContext) -> EventStream<'a> {
        stream::once((self.0)(ctx)).boxed()
    }
}

/// Step backed by a closure that returns a stream of events.
pub struct StreamStep<F>(F);

impl<F> StepFunction for StreamStep<F>
where
    F: for<'a> Fn(&'a mut ExecutionContext) -> EventStream<'a> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut ExecutionContext) -> EventStream<'a> {
        (self.0)(ctx)
    }
}

/// Wrap an async closure producing one event.
///
/// ```ignore
/// let step = step_fn(|ctx| Box::pin(async move {
///     ctx.set("searched", true);
///     Ok("results_found".to_string())
/// }));
/// ```
pub fn step_fn<F>(f: F) -> FnStep<F>
where
    F: for<'a> Fn(&'a mut ExecutionContext) -> BoxFuture<'a, anyhow::Result<String>> + Send + Sync,
{
    FnStep(f)
}

/// Wrap a closure producing a stream of events. Only the first event drives the transition.
pub fn stream_fn<F>(f: F) -> StreamStep<F>
where
    F: for<'a> Fn(&'a mut ExecutionContext) -> EventStream<'a> + Send + Sync,
{
    StreamStep(f)
}
