//! The persistent state of one workflow execution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use prana_core::{ExecutionId, NodeKey, WorkflowId};
use prana_graph::ExecutionGraph;
use serde_json::Value;

use crate::error::{ExecutionError, ExecutionErrorDetail};
use crate::node_execution::NodeExecution;
use crate::status::{ExecutionMode, ExecutionStatus, NodeExecutionStatus};

/// Runtime state derived from `node_executions`, kept alongside it for
/// cheap lookup during scheduling. Fully rebuildable from
/// `node_executions` alone (§8's round-trip property).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeState {
    /// Nodes that have completed at least once, in the order they first
    /// completed.
    pub executed_nodes: Vec<NodeKey>,
    /// `(from_key, from_port)` pairs that have fired at least once.
    pub active_paths: HashSet<(NodeKey, String)>,
    /// Values emitted onto a node's input ports that the node has not yet
    /// consumed.
    pub pending_inputs: HashMap<NodeKey, HashMap<String, Value>>,
}

impl RuntimeState {
    /// Rebuild runtime state by replaying every completed
    /// [`NodeExecution`], in `execution_index` order, against the compiled
    /// graph's connection map.
    ///
    /// A node is assumed to have consumed whatever was pending for it the
    /// moment it ran, so each replayed completion first clears its own
    /// node's pending entry before fanning its output out to downstream
    /// nodes. Replaying the full history this way (rather than only the
    /// suffix since the last checkpoint) is what makes this safe to call
    /// on every scheduling cycle, not just after a restart: it always
    /// lands on the same state incremental mutation would have produced.
    #[must_use]
    pub fn rebuild(node_executions: &HashMap<NodeKey, Vec<NodeExecution>>, graph: &ExecutionGraph) -> Self {
        let mut completions: Vec<(&NodeKey, &NodeExecution)> = node_executions
            .iter()
            .flat_map(|(key, runs)| runs.iter().filter(|run| run.status == NodeExecutionStatus::Completed).map(move |run| (key, run)))
            .collect();
        completions.sort_by_key(|(_, run)| run.execution_index);

        let mut state = RuntimeState::default();
        for (key, run) in completions {
            state.executed_nodes.push(key.clone());
            state.pending_inputs.remove(key);

            let Some(port) = run.emitted_port.clone() else { continue };
            state.active_paths.insert((key.clone(), port.clone()));

            for target in graph.outgoing(key, &port) {
                state
                    .pending_inputs
                    .entry(target.to.clone())
                    .or_default()
                    .insert(target.to_port.clone(), run.output.clone().unwrap_or(Value::Null));
            }
        }
        state
    }

    /// Consume (remove and return) the pending input on `node_key`'s
    /// `port`, if any has been emitted and not already consumed.
    pub fn take_pending_input(&mut self, node_key: &NodeKey, port: &str) -> Option<Value> {
        let inputs = self.pending_inputs.get_mut(node_key)?;
        let value = inputs.remove(port);
        if inputs.is_empty() {
            self.pending_inputs.remove(node_key);
        }
        value
    }
}

/// One running (or finished) instance of a compiled workflow.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Unique identifier for this execution.
    pub id: ExecutionId,
    /// The workflow this execution was compiled from.
    pub workflow_id: WorkflowId,
    /// The workflow version this execution was compiled from.
    pub workflow_version: u32,
    /// Whether the caller is blocked on this execution or was handed
    /// control back immediately.
    pub mode: ExecutionMode,
    /// Current execution-level status.
    pub status: ExecutionStatus,
    /// Execution-level variables, seeded from the workflow and possibly
    /// overridden by the caller at start time.
    pub vars: HashMap<String, Value>,
    /// Immutable environment values, fixed for the life of the execution.
    pub env: HashMap<String, Value>,
    /// The payload the trigger node was started with. The trigger has no
    /// upstream connection, so this is the only source of its `$input`.
    pub trigger_input: Value,
    /// The compiled graph this execution runs against.
    pub graph: Arc<ExecutionGraph>,
    /// Every invocation of every node, keyed by node. Ordered by
    /// `run_index` within each node's vector.
    pub node_executions: HashMap<NodeKey, Vec<NodeExecution>>,
    /// The node currently suspended, if `status` is `Suspended`.
    pub suspended_node_key: Option<NodeKey>,
    /// Per-node data returned by a handler's `prepare` call, kept for the
    /// life of the execution.
    pub preparation_data: HashMap<NodeKey, Value>,
    /// Set when `status` is `Failed`.
    #[allow(clippy::struct_field_names)]
    pub error: Option<ExecutionErrorDetail>,
    /// Next value to assign to a `NodeExecution::execution_index`.
    pub next_execution_index: u64,
    /// When this execution was created.
    pub created_at: DateTime<Utc>,
    /// When this execution last changed status.
    pub updated_at: DateTime<Utc>,
}

impl Execution {
    /// Start a new, `Pending` execution against a compiled graph.
    #[must_use]
    pub fn new(id: ExecutionId, mode: ExecutionMode, graph: Arc<ExecutionGraph>, vars: HashMap<String, Value>, trigger_input: Value, env: HashMap<String, Value>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            workflow_id: graph.workflow_id,
            workflow_version: graph.version,
            mode,
            status: ExecutionStatus::Pending,
            vars,
            env,
            trigger_input,
            graph,
            node_executions: HashMap::new(),
            suspended_node_key: None,
            preparation_data: HashMap::new(),
            error: None,
            next_execution_index: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Runtime state rebuilt from `node_executions`.
    #[must_use]
    pub fn runtime_state(&self) -> RuntimeState {
        RuntimeState::rebuild(&self.node_executions, &self.graph)
    }

    /// Allocate the next monotonic execution index.
    pub fn next_index(&mut self) -> u64 {
        let idx = self.next_execution_index;
        self.next_execution_index += 1;
        idx
    }

    /// The 0-based run index a new invocation of `node_key` would receive.
    #[must_use]
    pub fn next_run_index(&self, node_key: &NodeKey) -> u32 {
        self.node_executions.get(node_key).map_or(0, |runs| runs.len() as u32)
    }

    /// Record a new [`NodeExecution`] for `node_key`.
    pub fn push_node_execution(&mut self, node_key: NodeKey, run: NodeExecution) {
        self.node_executions.entry(node_key).or_default().push(run);
    }

    /// Move to a new execution-level status, validating the transition.
    pub fn transition_to(&mut self, new_status: ExecutionStatus, now: DateTime<Utc>) -> Result<(), ExecutionError> {
        if !is_valid_execution_transition(self.status, new_status) {
            return Err(ExecutionError::invalid_transition(self.status, new_status));
        }
        self.status = new_status;
        self.updated_at = now;
        if new_status != ExecutionStatus::Suspended {
            self.suspended_node_key = None;
        }
        Ok(())
    }

    /// Mark this execution suspended at `node_key`.
    pub fn suspend_at(&mut self, node_key: NodeKey, now: DateTime<Utc>) -> Result<(), ExecutionError> {
        self.transition_to(ExecutionStatus::Suspended, now)?;
        self.suspended_node_key = Some(node_key);
        Ok(())
    }

    /// Terminate this execution with an unrecovered error (§7).
    pub fn fail(&mut self, error: ExecutionErrorDetail, now: DateTime<Utc>) -> Result<(), ExecutionError> {
        self.transition_to(ExecutionStatus::Failed, now)?;
        self.error = Some(error);
        Ok(())
    }

    /// Resume a suspended execution back to `Running`.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<NodeKey, ExecutionError> {
        let node_key = self.suspended_node_key.clone().ok_or(ExecutionError::NotSuspended)?;
        self.transition_to(ExecutionStatus::Running, now)?;
        Ok(node_key)
    }
}

fn is_valid_execution_transition(from: ExecutionStatus, to: ExecutionStatus) -> bool {
    use ExecutionStatus::{Completed, Failed, Pending, Running, Suspended};
    matches!(
        (from, to),
        (Pending, Running) | (Running, Suspended) | (Running, Completed) | (Running, Failed) | (Suspended, Running) | (Suspended, Failed) | (Pending, Failed)
    )
}
