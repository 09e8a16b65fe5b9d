use std::collections::HashMap;

use prana_core::WorkflowId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connection::Connection;
use crate::error::WorkflowError;
use crate::node::Node;

/// Outbound edges, keyed by source node key then source output port.
///
/// `connections["a"]["main"]` is the list of targets fed by node `a`'s
/// `main` output port.
pub type Connections = HashMap<String, HashMap<String, Vec<Connection>>>;

/// A declarative workflow: nodes plus the connections between their ports.
///
/// This is the exact shape the Graph Compiler consumes; it carries no
/// runtime state (that lives in `prana-execution`'s `Execution`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Stable identifier of this workflow.
    pub id: WorkflowId,
    /// Human-readable name.
    pub name: String,
    /// Monotonically increasing version number.
    pub version: u32,
    /// Workflow-scoped variables exposed under `$vars`.
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    /// Every node in the graph, in author-given order.
    pub nodes: Vec<Node>,
    /// Outbound edges by source node key and port.
    #[serde(default)]
    pub connections: Connections,
}

impl Workflow {
    /// Look up a node by key, in author-given order.
    #[must_use]
    pub fn node(&self, key: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.key.as_str() == key)
    }

    /// Every connection target reachable from `from_key`'s `from_port`.
    #[must_use]
    pub fn targets_from(&self, from_key: &str, from_port: &str) -> &[Connection] {
        self.connections
            .get(from_key)
            .and_then(|ports| ports.get(from_port))
            .map_or(&[], Vec::as_slice)
    }

    /// Structural self-checks that do not require the Action Registry:
    /// no duplicate node keys, and every connection endpoint refers to a
    /// node that actually exists.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::DuplicateNodeKey`] or
    /// [`WorkflowError::UnknownConnectionEndpoint`].
    pub fn validate_structure(&self) -> Result<(), WorkflowError> {
        let mut seen = std::collections::HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.key.as_str()) {
                return Err(WorkflowError::DuplicateNodeKey {
                    key: node.key.as_str().to_owned(),
                });
            }
        }

        for (from_key, ports) in &self.connections {
            if self.node(from_key).is_none() {
                return Err(WorkflowError::UnknownConnectionEndpoint {
                    key: from_key.clone(),
                });
            }
            for targets in ports.values() {
                for target in targets {
                    if self.node(target.to.as_str()).is_none() {
                        return Err(WorkflowError::UnknownConnectionEndpoint {
                            key: target.to.as_str().to_owned(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
