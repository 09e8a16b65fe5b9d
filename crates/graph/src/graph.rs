use std::collections::HashMap;

use indexmap::IndexMap;
use prana_action::HandlerKind;
use prana_core::{NodeKey, WorkflowId};
use prana_workflow::{Connection, LoopSettings, RetrySettings};
use serde_json::Value;

/// A node after compilation: its raw definition plus everything resolved
/// from the Action Registry (ports, kind, suspendability).
#[derive(Debug, Clone)]
pub struct CompiledNode {
    /// The node's key.
    pub key: NodeKey,
    /// Fully-qualified handler type.
    pub node_type: String,
    /// Raw (unresolved) parameters.
    pub params: HashMap<String, prana_workflow::ParamValue>,
    /// Retry policy.
    pub retry: RetrySettings,
    /// Loop safety bound.
    pub loop_settings: LoopSettings,
    /// Trigger or action, from the handler descriptor.
    pub kind: HandlerKind,
    /// Declared input ports.
    pub input_ports: Vec<String>,
    /// Declared output ports.
    pub output_ports: Vec<String>,
    /// Whether the handler may suspend.
    pub suspendable: bool,
    /// Input ports that must all be populated before this node is ready.
    /// A merge node declares multiple; an ordinary node declares at most
    /// the one port it actually reads.
    pub required_input_ports: Vec<String>,
    /// Discovery order from a depth-first traversal of the node-level
    /// dependency graph starting at the trigger. Used, together with
    /// insertion order, to make same-cycle ready-set dispatch
    /// deterministic.
    pub topological_rank: usize,
}

impl CompiledNode {
    /// Whether this node is the workflow's trigger.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        self.kind == HandlerKind::Trigger
    }
}

/// A compiled, validated workflow ready for the Graph Executor.
///
/// Iteration order over [`nodes`](Self::nodes) always matches the
/// originating workflow's node order, so replays and tests observe
/// stable ordering.
#[derive(Debug, Clone)]
pub struct ExecutionGraph {
    /// Workflow this graph was compiled from.
    pub workflow_id: WorkflowId,
    /// Workflow version this graph was compiled from.
    pub version: u32,
    /// Node-key-indexed, insertion-order-preserving map of compiled nodes.
    pub nodes: IndexMap<NodeKey, CompiledNode>,
    /// Forward edges: `from_key -> from_port -> targets`.
    pub connection_map: HashMap<NodeKey, HashMap<String, Vec<Connection>>>,
    /// Reverse edges: `to_key -> [(from_key, from_port, to_port)]`.
    pub reverse_connection_map: HashMap<NodeKey, Vec<(NodeKey, String, String)>>,
    /// The workflow's single trigger node.
    pub trigger: NodeKey,
    /// Workflow-scoped variables, carried through unchanged.
    pub variables: HashMap<String, Value>,
}

impl ExecutionGraph {
    /// Look up a compiled node by key.
    #[must_use]
    pub fn node(&self, key: &NodeKey) -> Option<&CompiledNode> {
        self.nodes.get(key)
    }

    /// Every `(from_key, from_port, to_port)` edge feeding into `key`.
    #[must_use]
    pub fn incoming(&self, key: &NodeKey) -> &[(NodeKey, String, String)] {
        self.reverse_connection_map.get(key).map_or(&[], Vec::as_slice)
    }

    /// Every connection target fed by `key`'s `port` output.
    #[must_use]
    pub fn outgoing(&self, key: &NodeKey, port: &str) -> &[Connection] {
        self.connection_map
            .get(key)
            .and_then(|ports| ports.get(port))
            .map_or(&[], Vec::as_slice)
    }

    /// Total number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
