use chrono::{DateTime, Utc};
use prana_core::NodeKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExecutionErrorDetail;
use crate::status::NodeExecutionStatus;

/// Suspension kind meaning "retry after a delay"; re-enters `execute`
/// rather than `resume` (§4.7).
pub const SUSPENSION_KIND_RETRY: &str = "retry";

/// One invocation of one node. A node may have many of these across an
/// execution's lifetime — once per loop traversal, and once per retry
/// attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecution {
    /// The node this invocation belongs to.
    pub node_key: NodeKey,
    /// Monotonic index over the whole execution (across all nodes).
    pub execution_index: u64,
    /// 0-based count of this node's prior completed invocations.
    pub run_index: u32,
    /// Current status of this invocation.
    pub status: NodeExecutionStatus,
    /// Output value, once `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Which output port carried `output`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emitted_port: Option<String>,
    /// Error detail, if `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionErrorDetail>,
    /// Suspension kind, if `suspended` (e.g. `"webhook"`, `"retry"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspension_type: Option<String>,
    /// Opaque suspension payload, if `suspended`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspension_data: Option<Value>,
    /// The fully resolved params this invocation actually ran with.
    pub params: Value,
    /// When this invocation was dispatched.
    pub started_at: DateTime<Utc>,
    /// When this invocation reached a terminal or suspended state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl NodeExecution {
    /// Start a new, `running` invocation.
    #[must_use]
    pub fn start(node_key: NodeKey, execution_index: u64, run_index: u32, params: Value, started_at: DateTime<Utc>) -> Self {
        Self {
            node_key,
            execution_index,
            run_index,
            status: NodeExecutionStatus::Running,
            output: None,
            emitted_port: None,
            error: None,
            suspension_type: None,
            suspension_data: None,
            params,
            started_at,
            finished_at: None,
        }
    }

    /// Mark this invocation completed with the given output/port.
    pub fn complete(&mut self, output: Value, port: String, finished_at: DateTime<Utc>) {
        self.status = NodeExecutionStatus::Completed;
        self.output = Some(output);
        self.emitted_port = Some(port);
        self.finished_at = Some(finished_at);
    }

    /// Mark this invocation failed with the given error detail.
    pub fn fail(&mut self, error: ExecutionErrorDetail, finished_at: DateTime<Utc>) {
        self.status = NodeExecutionStatus::Failed;
        self.error = Some(error);
        self.finished_at = Some(finished_at);
    }

    /// Mark this invocation suspended with the given kind/payload.
    pub fn suspend(&mut self, kind: impl Into<String>, data: Value, finished_at: DateTime<Utc>) {
        self.status = NodeExecutionStatus::Suspended;
        self.suspension_type = Some(kind.into());
        self.suspension_data = Some(data);
        self.finished_at = Some(finished_at);
    }

    /// Whether this invocation's `suspension_type` is the retry kind.
    #[must_use]
    pub fn is_retry_suspension(&self) -> bool {
        self.suspension_type.as_deref() == Some(SUSPENSION_KIND_RETRY)
    }
}
