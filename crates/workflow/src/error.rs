use thiserror::Error;

/// Structural problems in a workflow definition that do not require the
/// Action Registry to detect. The Graph Compiler layers registry-backed
/// checks (trigger count, unknown handler types) on top of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
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
}
