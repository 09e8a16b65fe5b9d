//! The Graph Executor: the deterministic scheduling loop that drives a
//! compiled workflow to completion (§4.5).
//!
//! One cycle recomputes the ready set from scratch (`Execution::runtime_state`),
//! dispatches each ready node in `(topological_rank, insertion_order)` order,
//! and stops the instant any node suspends, fails, or the execution is
//! cancelled. Cancellation is checked only at cycle boundaries — a node
//! already dispatched always runs to completion (§5).

use std::sync::Arc;

use chrono::Utc;
use prana_action::ActionRegistry;
use prana_core::{ErrorKind, NodeKey};
use prana_execution::{Execution, ExecutionErrorDetail, ExecutionStatus};
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::middleware::{MiddlewareEvent, MiddlewarePipeline};
use crate::node_executor::{NodeEffect, NodeExecutor};

/// Where a drive (`start` or `resume`) left the execution.
#[derive(Debug)]
pub enum Outcome {
    /// Every reachable node ran to completion; no node is ready.
    Completed {
        /// The completed execution.
        execution: Execution,
    },
    /// A node suspended; `execution.suspended_node_key` names it.
    Suspended {
        /// The suspended execution.
        execution: Execution,
    },
    /// A node failed with no recovery path, or the execution was cancelled.
    Failed {
        /// The failed execution.
        execution: Execution,
        /// The terminal error (also recorded on `execution.error`).
        error: ExecutionErrorDetail,
    },
}

/// Drives one [`Execution`] against a compiled graph by repeatedly
/// computing the ready set and dispatching it through a [`NodeExecutor`].
pub struct GraphExecutor {
    node_executor: NodeExecutor,
    middleware: MiddlewarePipeline,
}

impl GraphExecutor {
    /// Build an executor around a shared Action Registry, with no
    /// middleware installed.
    #[must_use]
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self {
            node_executor: NodeExecutor::new(registry),
            middleware: MiddlewarePipeline::new(),
        }
    }

    /// Replace the middleware pipeline.
    #[must_use]
    pub fn with_middleware(mut self, middleware: MiddlewarePipeline) -> Self {
        self.middleware = middleware;
        self
    }

    /// Start a `Pending` execution and drive it until it completes,
    /// suspends, fails, or is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for a compiler/registry inconsistency; any
    /// node-level failure is folded into [`Outcome::Failed`] instead.
    pub async fn start(&self, mut execution: Execution, cancellation: CancellationToken) -> Result<Outcome, EngineError> {
        execution.transition_to(ExecutionStatus::Running, Utc::now())?;
        tracing::debug!(execution_id = %execution.id, workflow_id = %execution.workflow_id, "execution started");
        self.middleware.fire(
            MiddlewareEvent::ExecutionStarted,
            serde_json::json!({"execution_id": execution.id.to_string(), "workflow_id": execution.workflow_id.to_string()}),
        );
        self.run_loop(execution, cancellation).await
    }

    /// Resume a `Suspended` execution with externally supplied data and
    /// drive it until the next stopping point.
    ///
    /// A pending retry suspension re-enters `execute` (§4.7); any other
    /// suspension re-enters the handler's `resume` with `resume_data`.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub async fn resume(&self, mut execution: Execution, resume_data: serde_json::Value, cancellation: CancellationToken) -> Result<Outcome, EngineError> {
        let node_key = execution.resume(Utc::now())?;
        let is_retry = execution.node_executions.get(&node_key).and_then(|runs| runs.last()).is_some_and(|last| last.is_retry_suspension());

        let effect = if is_retry {
            self.node_executor.execute(&mut execution, &node_key, Utc::now(), &cancellation).await?
        } else {
            self.node_executor.resume(&mut execution, &node_key, resume_data, Utc::now(), &cancellation).await?
        };

        match self.settle(execution, effect) {
            Ok(execution) => self.run_loop(execution, cancellation).await,
            Err(outcome) => Ok(outcome),
        }
    }

    async fn run_loop(&self, mut execution: Execution, cancellation: CancellationToken) -> Result<Outcome, EngineError> {
        loop {
            if cancellation.is_cancelled() {
                tracing::warn!(execution_id = %execution.id, "execution cancelled");
                let detail = ExecutionErrorDetail::new(ErrorKind::Cancelled, "execution cancelled");
                execution.fail(detail.clone(), Utc::now())?;
                self.middleware.fire(MiddlewareEvent::ExecutionFailed, serde_json::json!({"error": detail.message}));
                return Ok(Outcome::Failed { execution, error: detail });
            }

            let ready = self.ready_nodes(&execution);
            if ready.is_empty() {
                execution.transition_to(ExecutionStatus::Completed, Utc::now())?;
                tracing::debug!(execution_id = %execution.id, "execution completed");
                self.middleware.fire(MiddlewareEvent::ExecutionCompleted, serde_json::json!({"execution_id": execution.id.to_string()}));
                return Ok(Outcome::Completed { execution });
            }

            for key in ready {
                if execution.status != ExecutionStatus::Running {
                    break;
                }

                let max_iterations = execution.graph.node(&key).expect("ready_nodes only returns keys present in the graph").loop_settings.max_loop_iterations;
                if execution.next_run_index(&key) >= max_iterations {
                    tracing::warn!(node = key.as_str(), max_iterations, "loop iteration bound exceeded");
                    let detail = ExecutionErrorDetail::new(ErrorKind::MaxIterationsExceeded, format!("node `{key}` exceeded its loop iteration bound")).with_node_key(key.as_str());
                    execution.fail(detail.clone(), Utc::now())?;
                    self.middleware.fire(MiddlewareEvent::ExecutionFailed, serde_json::json!({"error": detail.message}));
                    return Ok(Outcome::Failed { execution, error: detail });
                }

                self.middleware.fire(MiddlewareEvent::NodeStarted, serde_json::json!({"node_key": key.as_str()}));
                let effect = self.node_executor.execute(&mut execution, &key, Utc::now(), &cancellation).await?;
                execution = match self.settle(execution, effect) {
                    Ok(execution) => execution,
                    Err(outcome) => return Ok(outcome),
                };
            }
        }
    }

    /// Fire the matching middleware event for a [`NodeEffect`]. Returns
    /// `Ok(execution)` to keep looping, `Err(outcome)` to stop.
    fn settle(&self, execution: Execution, effect: NodeEffect) -> Result<Execution, Outcome> {
        match effect {
            NodeEffect::Continue => {
                self.middleware.fire(MiddlewareEvent::NodeCompleted, serde_json::Value::Null);
                Ok(execution)
            }
            NodeEffect::Suspended => {
                self.middleware.fire(MiddlewareEvent::ExecutionSuspended, serde_json::Value::Null);
                Err(Outcome::Suspended { execution })
            }
            NodeEffect::Failed(error) => {
                self.middleware.fire(MiddlewareEvent::NodeFailed, serde_json::json!({"error": error.message}));
                Err(Outcome::Failed { execution, error })
            }
        }
    }

    /// Every node ready to dispatch this cycle, in `(topological_rank,
    /// insertion_order)` order. A node is ready when every one of its
    /// required input ports has a pending value, or it is the trigger on
    /// its very first invocation.
    fn ready_nodes(&self, execution: &Execution) -> Vec<NodeKey> {
        let state = execution.runtime_state();
        let mut ready: Vec<_> = execution
            .graph
            .nodes
            .values()
            .filter(|node| {
                let bootstrapping_trigger = node.key == execution.graph.trigger && !state.executed_nodes.contains(&node.key);
                let inputs_satisfied = !node.required_input_ports.is_empty()
                    && node
                        .required_input_ports
                        .iter()
                        .all(|port| state.pending_inputs.get(&node.key).is_some_and(|inputs| inputs.contains_key(port)));
                bootstrapping_trigger || inputs_satisfied
            })
            .collect();
        ready.sort_by_key(|node| node.topological_rank);
        ready.into_iter().map(|node| node.key.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use prana_action::{ActionContext, HandlerKind, HandlerOutcome, HandlerResult};
    use prana_core::{ExecutionId, WorkflowId};
    use prana_execution::ExecutionMode;
    use prana_graph::{CompiledNode, ExecutionGraph};
    use prana_workflow::{Connection, LoopSettings, ParamValue, RetrySettings};
    use serde_json::Value;

    use super::*;

    fn fixed_time() -> chrono::DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    struct Passthrough {
        outputs: Vec<String>,
    }

    #[async_trait]
    impl prana_action::Handler for Passthrough {
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

    fn node(key: NodeKey, required: Vec<String>, rank: usize) -> CompiledNode {
        CompiledNode {
            key: key.clone(),
            node_type: "passthrough".to_string(),
            params: HashMap::from([("value".to_string(), ParamValue::literal(serde_json::json!("ok")))]),
            retry: RetrySettings::default(),
            loop_settings: LoopSettings::default(),
            kind: HandlerKind::Action,
            input_ports: required.clone(),
            output_ports: vec!["main".to_string()],
            suspendable: false,
            required_input_ports: required,
            topological_rank: rank,
        }
    }

    /// `trigger -> step` linear chain.
    fn linear_graph() -> Arc<ExecutionGraph> {
        let trigger = NodeKey::new("trigger").unwrap();
        let step = NodeKey::new("step").unwrap();
        let mut nodes = indexmap::IndexMap::new();
        nodes.insert(trigger.clone(), node(trigger.clone(), vec![], 0));
        nodes.insert(step.clone(), node(step.clone(), vec!["main".to_string()], 1));

        let mut connection_map = HashMap::new();
        connection_map.insert(trigger.clone(), HashMap::from([("main".to_string(), vec![Connection::to(step.clone(), "main")])]));

        Arc::new(ExecutionGraph {
            workflow_id: WorkflowId::v4(),
            version: 1,
            nodes,
            connection_map,
            reverse_connection_map: HashMap::new(),
            trigger,
            variables: HashMap::new(),
        })
    }

    #[tokio::test]
    async fn linear_chain_runs_to_completion() {
        let graph = linear_graph();
        let execution = Execution::new(ExecutionId::v4(), ExecutionMode::Sync, graph, HashMap::new(), serde_json::json!({"main": 1}), HashMap::new(), fixed_time());

        let mut registry = ActionRegistry::new();
        registry.register("passthrough", Arc::new(Passthrough { outputs: vec!["main".to_string()] }));
        let executor = GraphExecutor::new(Arc::new(registry));

        let outcome = executor.start(execution, CancellationToken::new()).await.unwrap();
        match outcome {
            Outcome::Completed { execution } => {
                assert_eq!(execution.status, ExecutionStatus::Completed);
                assert_eq!(execution.node_executions.len(), 2);
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_before_dispatch_fails_the_execution() {
        let graph = linear_graph();
        let execution = Execution::new(ExecutionId::v4(), ExecutionMode::Sync, graph, HashMap::new(), serde_json::json!({"main": 1}), HashMap::new(), fixed_time());

        let mut registry = ActionRegistry::new();
        registry.register("passthrough", Arc::new(Passthrough { outputs: vec!["main".to_string()] }));
        let executor = GraphExecutor::new(Arc::new(registry));

        let token = CancellationToken::new();
        token.cancel();
        let outcome = executor.start(execution, token).await.unwrap();
        match outcome {
            Outcome::Failed { error, .. } => assert_eq!(error.kind.0, ErrorKind::Cancelled),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
