#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Prana Execution
//!
//! Runtime execution state for the Prana workflow engine.
//!
//! This crate models execution-time concepts — it does NOT contain the
//! scheduling loop that drives them forward (that lives in
//! `prana-engine`). It defines:
//!
//! - [`ExecutionStatus`], [`NodeExecutionStatus`], [`ExecutionMode`] — the
//!   execution- and node-level state machines
//! - [`Execution`] and [`RuntimeState`] — persistent and derived state
//! - [`NodeExecution`] — one invocation of one node
//! - [`ExecutionErrorDetail`] and [`ExecutionError`] — error vocabulary

mod error;
mod node_execution;
mod state;
mod status;

pub use error::{ErrorKindWire, ExecutionError, ExecutionErrorDetail};
pub use node_execution::{NodeExecution, SUSPENSION_KIND_RETRY};
pub use state::{Execution, RuntimeState};
pub use status::{ExecutionMode, ExecutionStatus, NodeExecutionStatus};
