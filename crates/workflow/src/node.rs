use std::collections::HashMap;

use prana_core::NodeKey;
use serde::{Deserialize, Serialize};

use crate::param::ParamValue;

/// Per-node retry policy (§4.7 of the runtime contract this crate feeds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Whether a failed invocation should be retried.
    pub retry_on_failed: bool,
    /// Maximum number of retry attempts after the first failure.
    pub max_retries: u32,
    /// Delay, in milliseconds, before each retry attempt.
    pub retry_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            retry_on_failed: false,
            max_retries: 0,
            retry_delay_ms: 0,
        }
    }
}

/// Safety bound on cyclic (loop) traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    /// Maximum number of times a single node may re-execute within one
    /// execution before `max_iterations_exceeded` is raised.
    pub max_loop_iterations: u32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            max_loop_iterations: 1000,
        }
    }
}

/// A single node in a workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Author-chosen key, unique within the workflow.
    pub key: NodeKey,
    /// Fully-qualified handler type, resolved via the Action Registry
    /// (e.g. `"http.request"`, `"logic.if"`).
    #[serde(rename = "type")]
    pub node_type: String,
    /// Raw (unresolved) parameter tree.
    #[serde(default)]
    pub params: HashMap<String, ParamValue>,
    /// Retry policy for this node.
    #[serde(default)]
    pub retry: RetrySettings,
    /// Loop safety bound for this node.
    #[serde(default)]
    pub loop_settings: LoopSettings,
    /// Input ports (among the handler's declared `input_ports`) that may
    /// remain unpopulated when this node becomes ready. Used by merge
    /// nodes that accept a subset of their inputs; everything else is
    /// required by default.
    #[serde(default)]
    pub optional_input_ports: Vec<String>,
}

impl Node {
    /// Construct a node with no parameters and default policies.
    #[must_use]
    pub fn new(key: NodeKey, node_type: impl Into<String>) -> Self {
        Self {
            key,
            node_type: node_type.into(),
            params: HashMap::new(),
            retry: RetrySettings::default(),
            loop_settings: LoopSettings::default(),
            optional_input_ports: Vec::new(),
        }
    }

    /// Builder-style declaration of optional input ports (for merge nodes).
    #[must_use]
    pub fn with_optional_input_ports(mut self, ports: impl IntoIterator<Item = String>) -> Self {
        self.optional_input_ports = ports.into_iter().collect();
        self
    }

    /// Builder-style parameter insertion.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Builder-style retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }
}
