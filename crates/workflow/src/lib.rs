//! # Prana Workflow
//!
//! The declarative workflow definition: nodes, connections, and raw
//! (unresolved) parameters. This crate has no notion of execution or
//! handler dispatch — it is pure data plus the structural self-checks
//! that don't need the Action Registry.

mod connection;
mod error;
mod node;
mod param;
mod workflow;

pub use connection::Connection;
pub use error::WorkflowError;
pub use node::{LoopSettings, Node, RetrySettings};
pub use param::ParamValue;
pub use workflow::{Connections, Workflow};
