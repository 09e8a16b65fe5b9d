//! Middleware pipeline (§4.9): an ordered, synchronous chain of
//! observers/transformers the Graph Executor calls around each lifecycle
//! event. Each layer decides whether to call `next` at all — not calling
//! it short-circuits the rest of the chain and returns that layer's data
//! unchanged downstream.

use std::sync::Arc;

use serde_json::Value;

/// A lifecycle point the Graph Executor fires middleware at.
///
/// Payload shapes (by convention, not enforced by the type):
/// `ExecutionStarted`/`ExecutionCompleted` carry `{"execution_id", "workflow_id"}`;
/// `ExecutionFailed` adds `"error"`; `ExecutionSuspended` adds `"node_key"`;
/// `NodeStarted`/`NodeCompleted` carry `{"node_key", "run_index"}`, `NodeCompleted`
/// adds `"output"`/`"port"`; `NodeFailed` adds `"error"`;
/// `SubWorkflowRequested` carries `{"node_key", "workflow_id", "input"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MiddlewareEvent {
    /// An execution moved from `Pending` to `Running`.
    ExecutionStarted,
    /// An execution reached `Completed`.
    ExecutionCompleted,
    /// An execution reached `Failed`.
    ExecutionFailed,
    /// An execution reached `Suspended`.
    ExecutionSuspended,
    /// A node invocation was dispatched.
    NodeStarted,
    /// A node invocation reached `Completed`.
    NodeCompleted,
    /// A node invocation reached `Failed`.
    NodeFailed,
    /// A node handler requested a sub-workflow be run (reserved for a
    /// future cross-workflow invocation handler; no built-in handler
    /// emits this yet).
    SubWorkflowRequested,
}

/// The rest of the chain, as a one-shot continuation.
pub type Next<'a> = Box<dyn FnOnce(Value) -> Value + 'a>;

/// One layer in the pipeline.
pub trait Middleware: Send + Sync {
    /// Observe or transform `data` for `event`, optionally calling `next`
    /// to continue the chain. Returning without calling `next` drops
    /// every layer after this one for this event.
    fn call(&self, event: MiddlewareEvent, data: Value, next: Next<'_>) -> Value;
}

/// An ordered stack of [`Middleware`] layers, innermost-last.
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipeline {
    /// Build an empty pipeline (firing an event is a no-op passthrough).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer to the end of the chain.
    #[must_use]
    pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.layers.push(middleware);
        self
    }

    /// Run `data` through every layer in order for `event`.
    #[must_use]
    pub fn fire(&self, event: MiddlewareEvent, data: Value) -> Value {
        run(&self.layers, event, data)
    }
}

fn run(layers: &[Arc<dyn Middleware>], event: MiddlewareEvent, data: Value) -> Value {
    match layers.split_first() {
        None => data,
        Some((head, rest)) => {
            let next: Next<'_> = Box::new(move |data| run(rest, event, data));
            head.call(event, data, next)
        }
    }
}

impl std::fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewarePipeline").field("layers", &self.layers.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn empty_pipeline_passes_data_through() {
        let pipeline = MiddlewarePipeline::new();
        let data = serde_json::json!({"x": 1});
        assert_eq!(pipeline.fire(MiddlewareEvent::NodeStarted, data.clone()), data);
    }

    struct Tagging(&'static str);
    impl Middleware for Tagging {
        fn call(&self, _event: MiddlewareEvent, data: Value, next: Next<'_>) -> Value {
            let mut data = data;
            data[self.0] = serde_json::json!(true);
            next(data)
        }
    }

    #[test]
    fn layers_run_in_order() {
        let pipeline = MiddlewarePipeline::new().with(Arc::new(Tagging("first"))).with(Arc::new(Tagging("second")));
        let result = pipeline.fire(MiddlewareEvent::NodeStarted, serde_json::json!({}));
        assert_eq!(result, serde_json::json!({"first": true, "second": true}));
    }

    struct ShortCircuit;
    impl Middleware for ShortCircuit {
        fn call(&self, _event: MiddlewareEvent, _data: Value, _next: Next<'_>) -> Value {
            serde_json::json!({"blocked": true})
        }
    }

    #[test]
    fn not_calling_next_short_circuits_remaining_layers() {
        let calls = Arc::new(AtomicUsize::new(0));
        struct CountingTail(Arc<AtomicUsize>);
        impl Middleware for CountingTail {
            fn call(&self, _event: MiddlewareEvent, data: Value, next: Next<'_>) -> Value {
                self.0.fetch_add(1, Ordering::SeqCst);
                next(data)
            }
        }

        let pipeline = MiddlewarePipeline::new().with(Arc::new(ShortCircuit)).with(Arc::new(CountingTail(calls.clone())));
        let result = pipeline.fire(MiddlewareEvent::NodeStarted, serde_json::json!({}));
        assert_eq!(result, serde_json::json!({"blocked": true}));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
