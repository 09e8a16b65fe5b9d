//! Engine-level errors: failures in driving the scheduling loop itself, as
//! distinct from per-node failures (those live on the `Execution` record as
//! an `ExecutionErrorDetail` and never unwind through `Result`).

use prana_execution::ExecutionError;
use prana_expression::ExpressionError;
use thiserror::Error;

/// Errors the Graph Executor can raise.
///
/// [`NodeNotFound`](Self::NodeNotFound) and
/// [`HandlerNotFound`](Self::HandlerNotFound) indicate a caller or compiler
/// defect — a well-formed compiled graph and a fully-populated registry
/// never trigger them during ordinary scheduling. [`Expression`](Self::Expression)
/// is different: it is an expected, per-node outcome that the node
/// executor catches and folds into that node's failure handling (§4.7),
/// rather than letting it unwind the scheduling loop.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The compiled graph has no node under this key. The Graph Compiler
    /// is expected to guarantee every connection target exists; seeing
    /// this means that guarantee was violated.
    #[error("node not found in compiled graph: {0}")]
    NodeNotFound(String),

    /// No handler is registered for a node's declared type. The Graph
    /// Compiler resolves every node type against the registry at compile
    /// time, so this should only occur if the registry changed between
    /// compilation and execution.
    #[error("no handler registered for type {0}")]
    HandlerNotFound(String),

    /// Parameter resolution failed (`expression_error`, §7).
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// The underlying execution state machine rejected an operation.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}
