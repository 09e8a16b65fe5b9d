use thiserror::Error;

/// Structural errors raised while compiling a workflow into an
/// [`crate::ExecutionGraph`]. Every variant maps to the `compile_error`
/// error kind at the boundary that reports it to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two or more nodes declared the same key.
    #[error("duplicate node key `{key}`")]
    DuplicateNodeKey {
        /// The repeated key.
        key: String,
    },
    /// A connection referenced a node key that does not exist.
    #[error("connection references unknown node key `{key}`")]
    UnknownConnectionEndpoint {
        /// The missing key.
        key: String,
    },
    /// The workflow declared a trigger count other than exactly one.
    #[error("workflow must declare exactly one trigger node, found {count}")]
    InvalidTriggerCount {
        /// The number of trigger-kind nodes found.
        count: usize,
    },
    /// A node's declared type has no registered handler.
    #[error("no handler registered for node type `{node_type}` (node `{node_key}`)")]
    HandlerNotFound {
        /// The node that referenced the missing type.
        node_key: String,
        /// The unresolved type string.
        node_type: String,
    },
}

impl From<prana_workflow::WorkflowError> for GraphError {
    fn from(err: prana_workflow::WorkflowError) -> Self {
        match err {
            prana_workflow::WorkflowError::DuplicateNodeKey { key } => Self::DuplicateNodeKey { key },
            prana_workflow::WorkflowError::UnknownConnectionEndpoint { key } => {
                Self::UnknownConnectionEndpoint { key }
            }
        }
    }
}
