//! # Prana Action
//!
//! The handler contract every trigger and action implementation satisfies,
//! plus the registry the Graph Compiler and Node Executor use to resolve a
//! node's type to its capability descriptor.
//!
//! This crate defines **what** handlers are and **how they report
//! results**, not how the graph orchestrates them — that is
//! `prana-engine`'s job.
//!
//! ## Core Types
//!
//! - [`Handler`] — the trait every trigger/action implements
//! - [`HandlerOutcome`] — success/suspend result of `execute`/`resume`
//! - [`HandlerFailure`] — an [`ActionError`] paired with optional port routing
//! - [`ActionContext`] — runtime handle passed to every handler call
//! - [`ActionRegistry`] — type string to [`HandlerDescriptor`] lookup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Runtime context provided to handlers during execution.
pub mod context;
/// Error type distinguishing retryable from fatal failures.
pub mod error;
/// The handler trait, its outcome/failure types, and parameter schema.
pub mod handler;
/// Action registry for type-string lookup of handler descriptors.
pub mod registry;

pub use context::ActionContext;
pub use error::ActionError;
pub use handler::{
    FieldError, Handler, HandlerFailure, HandlerKind, HandlerOutcome, HandlerResult, ParamField, ParamsSchema,
};
pub use registry::{ActionRegistry, HandlerDescriptor};
