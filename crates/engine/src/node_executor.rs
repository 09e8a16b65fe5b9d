//! Node Executor (§4.4): dispatches one invocation of one node against the
//! Action Registry and records the outcome on the [`Execution`].
//!
//! Retry re-entry, loop re-entry, and a handler-declared resume are the
//! three ways a node can be invoked; all three funnel through
//! [`NodeExecutor::execute`]/[`NodeExecutor::resume`] and come out the
//! other side as one [`NodeExecution`] appended or replaced in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use prana_action::{ActionContext, ActionRegistry, HandlerFailure, HandlerOutcome};
use prana_core::{ErrorKind, NodeKey};
use prana_execution::{Execution, ExecutionErrorDetail, NodeExecution, NodeExecutionStatus, SUSPENSION_KIND_RETRY};
use prana_workflow::RetrySettings;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::context_builder;
use crate::error::EngineError;
use crate::param_resolver::ParamResolver;

/// What the scheduling loop should do after one node invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEffect {
    /// The node reached a `Completed` invocation (on its success port or a
    /// recovered error port); recompute the ready set and continue.
    Continue,
    /// The node suspended — a handler-initiated wait or a retry backoff.
    Suspended,
    /// The node failed with no recovery path; the execution is now
    /// `Failed`.
    Failed(ExecutionErrorDetail),
}

enum Invocation {
    Execute,
    Resume(Value),
}

/// Dispatches node invocations and classifies their results (§4.4, §4.7).
pub struct NodeExecutor {
    registry: Arc<ActionRegistry>,
    resolver: ParamResolver,
}

impl NodeExecutor {
    /// Build an executor around a shared Action Registry.
    #[must_use]
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self {
            registry,
            resolver: ParamResolver::new(),
        }
    }

    /// Run one invocation of `node_key`. Transparently continues a pending
    /// retry suspension in place rather than starting a fresh invocation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the graph or registry is inconsistent
    /// with the execution (a compiler or caller defect, not a node-level
    /// failure — those are folded into the returned [`NodeEffect`]).
    pub async fn execute(&self, execution: &mut Execution, node_key: &NodeKey, now: DateTime<Utc>, cancellation: &CancellationToken) -> Result<NodeEffect, EngineError> {
        self.dispatch(execution, node_key, now, cancellation, Invocation::Execute).await
    }

    /// Resume a handler-declared (non-retry) suspension with external data.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn resume(&self, execution: &mut Execution, node_key: &NodeKey, resume_data: Value, now: DateTime<Utc>, cancellation: &CancellationToken) -> Result<NodeEffect, EngineError> {
        self.dispatch(execution, node_key, now, cancellation, Invocation::Resume(resume_data)).await
    }

    async fn dispatch(&self, execution: &mut Execution, node_key: &NodeKey, now: DateTime<Utc>, cancellation: &CancellationToken, invocation: Invocation) -> Result<NodeEffect, EngineError> {
        let node = execution.graph.node(node_key).cloned().ok_or_else(|| EngineError::NodeNotFound(node_key.as_str().to_string()))?;
        let descriptor = self.registry.resolve(&node.node_type).ok_or_else(|| EngineError::HandlerNotFound(node.node_type.clone()))?;
        let handler = descriptor.handler.clone();
        let suspendable = descriptor.suspendable;
        let declared_error_port = descriptor.error_port.clone();
        let default_port = descriptor.output_ports.first().cloned().unwrap_or_else(|| "main".to_string());
        let accepts_port = |port: &str| descriptor.accepts_output_port(port);

        let pending_retry = execution
            .node_executions
            .get(node_key)
            .and_then(|runs| runs.last())
            .filter(|last| last.status == NodeExecutionStatus::Suspended && last.is_retry_suspension())
            .cloned();

        let (run_index, attempt_number, reuse) = match &pending_retry {
            Some(retry) => {
                let attempt_number = retry
                    .suspension_data
                    .as_ref()
                    .and_then(|data| data.get("attempt_number"))
                    .and_then(serde_json::Value::as_u64)
                    .unwrap_or(0) as u32;
                (retry.run_index, attempt_number, true)
            }
            None => (execution.next_run_index(node_key), 0, false),
        };

        if run_index == 0 && !reuse {
            match handler.prepare(node_key.as_str()) {
                Ok(data) => {
                    execution.preparation_data.insert(node_key.clone(), data);
                }
                Err(err) => {
                    let detail = ExecutionErrorDetail::new(ErrorKind::ActionError, err.to_string()).with_node_key(node_key.as_str());
                    return self.record_failure(execution, node_key, &node.retry, run_index, attempt_number, reuse, Value::Null, detail, None, declared_error_port.as_deref(), now);
                }
            }
        }

        let eval_ctx = context_builder::build(execution, node_key, run_index, attempt_number);
        let params = match self.resolver.resolve(&node.params, &eval_ctx) {
            Ok(params) => params,
            Err(EngineError::Expression(err)) => {
                let detail = ExecutionErrorDetail::new(ErrorKind::ExpressionError, err.to_string()).with_node_key(node_key.as_str());
                return self.record_failure(execution, node_key, &node.retry, run_index, attempt_number, reuse, Value::Null, detail, None, declared_error_port.as_deref(), now);
            }
            Err(other) => return Err(other),
        };

        let action_ctx = ActionContext::new(execution.id, node_key.clone(), execution.workflow_id)
            .with_cancellation(cancellation.clone())
            .with_variables(value_map_to_json_map(&execution.vars));

        let outcome = match invocation {
            Invocation::Execute => handler.execute(params.clone(), &action_ctx).await,
            Invocation::Resume(resume_data) => handler.resume(params.clone(), &action_ctx, resume_data).await,
        };
        execution.vars = json_map_to_value_map(&action_ctx.variables_snapshot());

        match outcome {
            Ok(HandlerOutcome::Success { output, port }) => {
                let port = port.unwrap_or(default_port);
                if !accepts_port(&port) {
                    let detail =
                        ExecutionErrorDetail::new(ErrorKind::ActionError, format!("handler emitted undeclared output port `{port}`")).with_node_key(node_key.as_str());
                    return self.record_failure(execution, node_key, &node.retry, run_index, attempt_number, reuse, params, detail, None, declared_error_port.as_deref(), now);
                }
                let slot = self.slot(execution, node_key, run_index, params, reuse, now);
                slot.complete(output, port, now);
                Ok(NodeEffect::Continue)
            }
            Ok(HandlerOutcome::Suspend { kind, data }) => {
                if !suspendable {
                    let detail = ExecutionErrorDetail::new(ErrorKind::SuspendNotPermitted, format!("handler for `{}` is not suspendable", node.node_type))
                        .with_node_key(node_key.as_str());
                    return self.record_failure(execution, node_key, &node.retry, run_index, attempt_number, reuse, params, detail, None, declared_error_port.as_deref(), now);
                }
                let slot = self.slot(execution, node_key, run_index, params, reuse, now);
                slot.suspend(kind, data, now);
                execution.suspend_at(node_key.clone(), now)?;
                Ok(NodeEffect::Suspended)
            }
            Err(HandlerFailure { error, port }) => {
                let detail = ExecutionErrorDetail::new(ErrorKind::ActionError, error.to_string()).with_node_key(node_key.as_str());
                self.record_failure(execution, node_key, &node.retry, run_index, attempt_number, reuse, params, detail, port, declared_error_port.as_deref(), now)
            }
        }
    }

    /// Get or create this invocation's `NodeExecution` slot. A retry
    /// re-entry replaces the existing record in place (§4.7/§4.8); a fresh
    /// invocation appends a new one.
    fn slot<'e>(&self, execution: &'e mut Execution, node_key: &NodeKey, run_index: u32, params: Value, reuse: bool, started_at: DateTime<Utc>) -> &'e mut NodeExecution {
        if reuse {
            let slot = execution.node_executions.get_mut(node_key).and_then(|runs| runs.last_mut()).expect("reuse implies an existing suspended record");
            slot.params = params;
            slot.status = NodeExecutionStatus::Running;
            slot
        } else {
            let index = execution.next_index();
            let run = NodeExecution::start(node_key.clone(), index, run_index, params, started_at);
            execution.push_node_execution(node_key.clone(), run);
            execution.node_executions.get_mut(node_key).and_then(|runs| runs.last_mut()).expect("just pushed")
        }
    }

    /// Classify one node-level failure into a retry suspension, a
    /// recovered error-port completion, or a terminal execution failure
    /// (§4.7, §7).
    #[allow(clippy::too_many_arguments)]
    fn record_failure(
        &self,
        execution: &mut Execution,
        node_key: &NodeKey,
        retry: &RetrySettings,
        run_index: u32,
        attempt_number: u32,
        reuse: bool,
        params: Value,
        mut detail: ExecutionErrorDetail,
        explicit_port: Option<String>,
        declared_error_port: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<NodeEffect, EngineError> {
        if retry.retry_on_failed && attempt_number < retry.max_retries {
            let next_attempt = attempt_number + 1;
            tracing::debug!(node = node_key.as_str(), attempt = next_attempt, delay_ms = retry.retry_delay_ms, "node failed, retrying");
            let payload = serde_json::json!({
                "attempt_number": next_attempt,
                "max_attempts": retry.max_retries + 1,
                "retry_delay_ms": retry.retry_delay_ms,
                "original_error": {
                    "kind": detail.kind.0.as_str(),
                    "message": detail.message,
                },
            });
            let slot = self.slot(execution, node_key, run_index, params, reuse, now);
            slot.suspend(SUSPENSION_KIND_RETRY, payload, now);
            execution.suspend_at(node_key.clone(), now)?;
            return Ok(NodeEffect::Suspended);
        }

        if retry.retry_on_failed && attempt_number >= retry.max_retries {
            tracing::warn!(node = node_key.as_str(), attempts = attempt_number, "retries exhausted");
            detail.kind = prana_execution::ErrorKindWire(ErrorKind::RetryExhausted);
        }

        let error_port = explicit_port.or_else(|| declared_error_port.map(ToOwned::to_owned));
        if let Some(port) = error_port {
            if !execution.graph.outgoing(node_key, &port).is_empty() {
                let output = serde_json::json!({
                    "kind": detail.kind.0.as_str(),
                    "message": detail.message,
                    "details": detail.details,
                });
                let slot = self.slot(execution, node_key, run_index, params, reuse, now);
                slot.complete(output, port, now);
                slot.error = Some(detail);
                return Ok(NodeEffect::Continue);
            }
        }

        tracing::warn!(node = node_key.as_str(), kind = detail.kind.0.as_str(), message = %detail.message, "node failed, terminating execution");
        let slot = self.slot(execution, node_key, run_index, params, reuse, now);
        slot.fail(detail.clone(), now);
        execution.fail(detail.clone(), now)?;
        Ok(NodeEffect::Failed(detail))
    }
}

fn value_map_to_json_map(vars: &std::collections::HashMap<String, Value>) -> serde_json::Map<String, Value> {
    vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn json_map_to_value_map(vars: &serde_json::Map<String, Value>) -> std::collections::HashMap<String, Value> {
    vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use prana_action::{ActionError, HandlerKind, HandlerResult};
    use prana_core::{ExecutionId, WorkflowId};
    use prana_execution::ExecutionMode;
    use prana_graph::{CompiledNode, ExecutionGraph};
    use prana_workflow::{Connection, LoopSettings, ParamValue};

    use super::*;

    fn fixed_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    struct EchoHandler {
        outputs: Vec<String>,
    }

    #[async_trait]
    impl prana_action::Handler for EchoHandler {
        fn kind(&self) -> HandlerKind {
            HandlerKind::Action
        }
        fn input_ports(&self) -> &[String] {
            &[]
        }
        fn output_ports(&self) -> &[String] {
            &self.outputs
        }
        async fn execute(&self, params: Value, _ctx: &ActionContext) -> HandlerResult {
            Ok(HandlerOutcome::ok(params))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl prana_action::Handler for AlwaysFails {
        fn kind(&self) -> HandlerKind {
            HandlerKind::Action
        }
        fn input_ports(&self) -> &[String] {
            &[]
        }
        fn output_ports(&self) -> &[String] {
            &[]
        }
        async fn execute(&self, _params: Value, _ctx: &ActionContext) -> HandlerResult {
            Err(ActionError::fatal("boom").into())
        }
    }

    struct SuspendsThenResumes;

    #[async_trait]
    impl prana_action::Handler for SuspendsThenResumes {
        fn kind(&self) -> HandlerKind {
            HandlerKind::Action
        }
        fn input_ports(&self) -> &[String] {
            &[]
        }
        fn output_ports(&self) -> &[String] {
            &[]
        }
        fn suspendable(&self) -> bool {
            true
        }
        async fn execute(&self, _params: Value, _ctx: &ActionContext) -> HandlerResult {
            Ok(HandlerOutcome::suspend("webhook", serde_json::json!({"id": "w1"})))
        }
        async fn resume(&self, _params: Value, _ctx: &ActionContext, resume_data: Value) -> HandlerResult {
            Ok(HandlerOutcome::ok(resume_data))
        }
    }

    fn graph_with_node(key: NodeKey, node_type: &str, retry: RetrySettings, to_main: Option<NodeKey>) -> Arc<ExecutionGraph> {
        let mut nodes = indexmap::IndexMap::new();
        nodes.insert(
            key.clone(),
            CompiledNode {
                key: key.clone(),
                node_type: node_type.to_string(),
                params: HashMap::from([("x".to_string(), ParamValue::literal(serde_json::json!(1)))]),
                retry,
                loop_settings: LoopSettings::default(),
                kind: HandlerKind::Action,
                input_ports: vec![],
                output_ports: vec!["main".to_string()],
                suspendable: true,
                required_input_ports: vec![],
                topological_rank: 0,
            },
        );
        let mut connection_map = HashMap::new();
        if let Some(target) = to_main {
            connection_map.insert(key.clone(), HashMap::from([("main".to_string(), vec![Connection::to(target, "main")])]));
        }
        Arc::new(ExecutionGraph {
            workflow_id: WorkflowId::v4(),
            version: 1,
            nodes,
            connection_map,
            reverse_connection_map: HashMap::new(),
            trigger: key,
            variables: HashMap::new(),
        })
    }

    fn execution(graph: Arc<ExecutionGraph>) -> Execution {
        let mut exec = Execution::new(ExecutionId::v4(), ExecutionMode::Sync, graph, HashMap::new(), serde_json::json!({"main": 1}), HashMap::new(), fixed_time());
        exec.transition_to(prana_execution::ExecutionStatus::Running, fixed_time()).unwrap();
        exec
    }

    #[tokio::test]
    async fn successful_execute_completes_on_default_port() {
        let key = NodeKey::new("n").unwrap();
        let graph = graph_with_node(key.clone(), "echo", RetrySettings::default(), None);
        let mut exec = execution(graph);
        let mut registry = ActionRegistry::new();
        registry.register("echo", Arc::new(EchoHandler { outputs: vec!["main".into()] }));
        let executor = NodeExecutor::new(Arc::new(registry));

        let effect = executor.execute(&mut exec, &key, fixed_time(), &CancellationToken::new()).await.unwrap();
        assert_eq!(effect, NodeEffect::Continue);
        let run = exec.node_executions[&key].last().unwrap();
        assert_eq!(run.status, NodeExecutionStatus::Completed);
        assert_eq!(run.emitted_port.as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn fatal_error_with_no_retry_terminates_execution() {
        let key = NodeKey::new("n").unwrap();
        let graph = graph_with_node(key.clone(), "fail", RetrySettings::default(), None);
        let mut exec = execution(graph);
        let mut registry = ActionRegistry::new();
        registry.register("fail", Arc::new(AlwaysFails));
        let executor = NodeExecutor::new(Arc::new(registry));

        let effect = executor.execute(&mut exec, &key, fixed_time(), &CancellationToken::new()).await.unwrap();
        assert!(matches!(effect, NodeEffect::Failed(_)));
        assert_eq!(exec.status, prana_execution::ExecutionStatus::Failed);
        assert!(exec.error.is_some());
    }

    #[tokio::test]
    async fn retry_eligible_failure_suspends_with_retry_kind() {
        let key = NodeKey::new("n").unwrap();
        let retry = RetrySettings {
            retry_on_failed: true,
            max_retries: 1,
            retry_delay_ms: 10,
        };
        let graph = graph_with_node(key.clone(), "fail", retry, None);
        let mut exec = execution(graph);
        let mut registry = ActionRegistry::new();
        registry.register("fail", Arc::new(AlwaysFails));
        let executor = NodeExecutor::new(Arc::new(registry));

        let effect = executor.execute(&mut exec, &key, fixed_time(), &CancellationToken::new()).await.unwrap();
        assert_eq!(effect, NodeEffect::Suspended);
        let run = exec.node_executions[&key].last().unwrap();
        assert!(run.is_retry_suspension());
        assert_eq!(exec.status, prana_execution::ExecutionStatus::Suspended);
    }

    #[tokio::test]
    async fn second_retry_attempt_exhausts_and_terminates() {
        let key = NodeKey::new("n").unwrap();
        let retry = RetrySettings {
            retry_on_failed: true,
            max_retries: 1,
            retry_delay_ms: 10,
        };
        let graph = graph_with_node(key.clone(), "fail", retry, None);
        let mut exec = execution(graph);
        let mut registry = ActionRegistry::new();
        registry.register("fail", Arc::new(AlwaysFails));
        let executor = NodeExecutor::new(Arc::new(registry));

        executor.execute(&mut exec, &key, fixed_time(), &CancellationToken::new()).await.unwrap();
        exec.transition_to(prana_execution::ExecutionStatus::Running, fixed_time()).unwrap();
        let effect = executor.execute(&mut exec, &key, fixed_time(), &CancellationToken::new()).await.unwrap();

        assert!(matches!(effect, NodeEffect::Failed(_)));
        assert_eq!(exec.node_executions[&key].len(), 1, "retry reuses the same record");
        let run = &exec.node_executions[&key][0];
        assert_eq!(run.error.as_ref().unwrap().kind.0, ErrorKind::RetryExhausted);
    }

    #[tokio::test]
    async fn suspend_then_resume_completes_with_resume_data() {
        let key = NodeKey::new("n").unwrap();
        let graph = graph_with_node(key.clone(), "wait", RetrySettings::default(), None);
        let mut exec = execution(graph);
        let mut registry = ActionRegistry::new();
        registry.register("wait", Arc::new(SuspendsThenResumes));
        let executor = NodeExecutor::new(Arc::new(registry));

        let effect = executor.execute(&mut exec, &key, fixed_time(), &CancellationToken::new()).await.unwrap();
        assert_eq!(effect, NodeEffect::Suspended);

        exec.resume(fixed_time()).unwrap();
        let effect = executor.resume(&mut exec, &key, serde_json::json!({"ok": true}), fixed_time(), &CancellationToken::new()).await.unwrap();
        assert_eq!(effect, NodeEffect::Continue);
        let run = exec.node_executions[&key].last().unwrap();
        assert_eq!(run.output, Some(serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn non_suspendable_handler_suspending_is_terminal() {
        struct BadSuspend;
        #[async_trait]
        impl prana_action::Handler for BadSuspend {
            fn kind(&self) -> HandlerKind {
                HandlerKind::Action
            }
            fn input_ports(&self) -> &[String] {
                &[]
            }
            fn output_ports(&self) -> &[String] {
                &[]
            }
            async fn execute(&self, _params: Value, _ctx: &ActionContext) -> HandlerResult {
                Ok(HandlerOutcome::suspend("webhook", Value::Null))
            }
        }

        let key = NodeKey::new("n").unwrap();
        let graph = graph_with_node(key.clone(), "bad", RetrySettings::default(), None);
        let mut exec = execution(graph);
        let mut registry = ActionRegistry::new();
        registry.register("bad", Arc::new(BadSuspend));
        let executor = NodeExecutor::new(Arc::new(registry));

        let effect = executor.execute(&mut exec, &key, fixed_time(), &CancellationToken::new()).await.unwrap();
        match effect {
            NodeEffect::Failed(detail) => assert_eq!(detail.kind.0, ErrorKind::SuspendNotPermitted),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn handler_failure_with_port_routes_to_connected_error_port() {
        struct RoutesError {
            outputs: Vec<String>,
        }
        #[async_trait]
        impl prana_action::Handler for RoutesError {
            fn kind(&self) -> HandlerKind {
                HandlerKind::Action
            }
            fn input_ports(&self) -> &[String] {
                &[]
            }
            fn output_ports(&self) -> &[String] {
                &self.outputs
            }
            async fn execute(&self, _params: Value, _ctx: &ActionContext) -> HandlerResult {
                Err(HandlerFailure::on_port(ActionError::fatal("bad request"), "error"))
            }
        }

        let key = NodeKey::new("n").unwrap();
        let downstream = NodeKey::new("d").unwrap();
        let mut graph = (*graph_with_node(key.clone(), "routes", RetrySettings::default(), None)).clone();
        graph.connection_map.insert(key.clone(), HashMap::from([("error".to_string(), vec![Connection::to(downstream, "main")])]));
        graph.nodes.get_mut(&key).unwrap().output_ports = vec!["error".to_string()];
        let mut exec = execution(Arc::new(graph));
        let mut registry = ActionRegistry::new();
        registry.register(
            "routes",
            Arc::new(RoutesError {
                outputs: vec!["error".to_string()],
            }),
        );
        let executor = NodeExecutor::new(Arc::new(registry));

        let effect = executor.execute(&mut exec, &key, fixed_time(), &CancellationToken::new()).await.unwrap();
        assert_eq!(effect, NodeEffect::Continue);
        let run = exec.node_executions[&key].last().unwrap();
        assert_eq!(run.status, NodeExecutionStatus::Completed);
        assert_eq!(run.emitted_port.as_deref(), Some("error"));
        assert!(run.error.is_some());
    }

    #[tokio::test]
    async fn retry_suspension_and_resume_use_one_based_attempt_number() {
        struct FailsOnceThenSucceeds {
            calls: std::sync::atomic::AtomicUsize,
        }
        #[async_trait]
        impl prana_action::Handler for FailsOnceThenSucceeds {
            fn kind(&self) -> HandlerKind {
                HandlerKind::Action
            }
            fn input_ports(&self) -> &[String] {
                &[]
            }
            fn output_ports(&self) -> &[String] {
                &[]
            }
            async fn execute(&self, params: Value, _ctx: &ActionContext) -> HandlerResult {
                if self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                    Err(ActionError::fatal("first attempt fails").into())
                } else {
                    Ok(HandlerOutcome::ok(params))
                }
            }
        }

        let key = NodeKey::new("n").unwrap();
        let retry = RetrySettings {
            retry_on_failed: true,
            max_retries: 2,
            retry_delay_ms: 10,
        };
        let mut graph = (*graph_with_node(key.clone(), "flaky", retry, None)).clone();
        graph.nodes.get_mut(&key).unwrap().params = HashMap::from([("attempt".to_string(), ParamValue::template("{{ $execution.attempt_number }}"))]);
        let mut exec = execution(Arc::new(graph));
        let mut registry = ActionRegistry::new();
        registry.register(
            "flaky",
            Arc::new(FailsOnceThenSucceeds {
                calls: std::sync::atomic::AtomicUsize::new(0),
            }),
        );
        let executor = NodeExecutor::new(Arc::new(registry));

        let effect = executor.execute(&mut exec, &key, fixed_time(), &CancellationToken::new()).await.unwrap();
        assert_eq!(effect, NodeEffect::Suspended);
        let run = exec.node_executions[&key].last().unwrap();
        assert_eq!(run.suspension_data.as_ref().unwrap()["attempt_number"], serde_json::json!(1));

        exec.transition_to(prana_execution::ExecutionStatus::Running, fixed_time()).unwrap();
        let effect = executor.execute(&mut exec, &key, fixed_time(), &CancellationToken::new()).await.unwrap();
        assert_eq!(effect, NodeEffect::Continue);
        let run = exec.node_executions[&key].last().unwrap();
        assert_eq!(run.params["attempt"], serde_json::json!(1));
    }
}
