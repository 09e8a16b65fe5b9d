//! # Prana Core
//!
//! Foundational identifiers and error vocabulary shared by every crate in
//! the Prana workflow execution engine. Nothing here knows about workflows,
//! nodes, or execution — that comes from `prana-workflow`, `prana-graph`,
//! and `prana-execution`.

mod error;
mod ids;

pub use error::{CoreError, ErrorKind};
pub use ids::{ExecutionId, KeyParseError, NodeKey, WorkflowId};

/// Result type used throughout Prana's core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Common prelude re-exporting the identifiers nearly every crate needs.
pub mod prelude {
    pub use crate::{CoreError, ErrorKind, ExecutionId, NodeKey, WorkflowId};
}
