//! # Prana Graph
//!
//! The Graph Compiler: turns a declarative [`prana_workflow::Workflow`]
//! into a validated, registry-resolved [`ExecutionGraph`] the Graph
//! Executor can run.

mod compiler;
mod error;
mod graph;

pub use compiler::compile;
pub use error::GraphError;
pub use graph::{CompiledNode, ExecutionGraph};
