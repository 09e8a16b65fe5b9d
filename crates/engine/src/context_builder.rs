//! Builds the per-invocation [`EvaluationContext`] handed to the parameter
//! resolver and, transitively, to the handler (§4.3).

use std::collections::HashMap;

use prana_core::NodeKey;
use prana_execution::{Execution, NodeExecutionStatus};
use prana_expression::{EvaluationContext, ExecutionInfo, NodeSnapshot};
use serde_json::Value;

/// Build the evaluation context for one invocation of `node_key`.
///
/// `$input` is drawn from the node's pending inputs, except for the
/// trigger's very first invocation, which has no upstream connection and
/// is instead seeded from [`Execution::trigger_input`]. `$nodes` snapshots
/// every node that has executed at least once; `$vars`/`$env` are copied
/// verbatim; `$execution` carries the run and attempt counters for this
/// specific invocation, not the node's overall history.
#[must_use]
pub fn build(execution: &Execution, node_key: &NodeKey, run_index: u32, attempt_number: u32) -> EvaluationContext {
    let state = execution.runtime_state();

    let mut input = state.pending_inputs.get(node_key).cloned().unwrap_or_default();
    if node_key == &execution.graph.trigger && input.is_empty() {
        input.insert("main".to_string(), execution.trigger_input.clone());
    }

    let mut nodes = HashMap::new();
    for (key, runs) in &execution.node_executions {
        let Some(last) = runs.last() else { continue };
        let status = match last.status {
            NodeExecutionStatus::Pending => "pending",
            NodeExecutionStatus::Running => "running",
            NodeExecutionStatus::Completed => "completed",
            NodeExecutionStatus::Failed => "failed",
            NodeExecutionStatus::Suspended => "suspended",
        };
        nodes.insert(
            key.as_str().to_string(),
            NodeSnapshot {
                output: last.output.clone().unwrap_or(Value::Null),
                status: status.to_string(),
            },
        );
    }

    EvaluationContext::new(
        input,
        nodes,
        execution.vars.clone(),
        execution.env.clone(),
        ExecutionInfo {
            run_index,
            attempt_number,
            execution_id: execution.id.to_string(),
            workflow_id: execution.workflow_id.to_string(),
        },
    )
}
