//! Execution error types.

use prana_core::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::status::ExecutionStatus;

/// The recorded error for one failed [`crate::NodeExecution`].
///
/// Carries the stable [`ErrorKind`] so a caller can branch on failure
/// category without parsing `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionErrorDetail {
    /// Stable failure category.
    pub kind: ErrorKindWire,
    /// The node this error originated at, if any (errors raised before
    /// dispatch, e.g. compile errors, carry `None`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_key: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Arbitrary structured context (e.g. the failed field list for a
    /// parameter error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ExecutionErrorDetail {
    /// Build a detail from a core [`ErrorKind`] and message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKindWire(kind),
            node_key: None,
            message: message.into(),
            details: None,
        }
    }

    /// Attach the node this error occurred at.
    #[must_use]
    pub fn with_node_key(mut self, node_key: impl Into<String>) -> Self {
        self.node_key = Some(node_key.into());
        self
    }

    /// Attach structured context.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Serde-friendly wrapper around [`ErrorKind`], which lives in `prana-core`
/// and has no `Serialize`/`Deserialize` impl of its own (it is a plain enum
/// used for in-process branching, not wire transport).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorKindWire(pub ErrorKind);

impl Serialize for ErrorKindWire {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorKindWire {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let kind = match s.as_str() {
            "compile_error" => ErrorKind::CompileError,
            "handler_not_found" => ErrorKind::HandlerNotFound,
            "parameter_error" => ErrorKind::ParameterError,
            "expression_error" => ErrorKind::ExpressionError,
            "action_error" => ErrorKind::ActionError,
            "suspend_not_permitted" => ErrorKind::SuspendNotPermitted,
            "retry_exhausted" => ErrorKind::RetryExhausted,
            "max_iterations_exceeded" => ErrorKind::MaxIterationsExceeded,
            "cancelled" => ErrorKind::Cancelled,
            other => return Err(serde::de::Error::custom(format!("unknown error kind: {other}"))),
        };
        Ok(Self(kind))
    }
}

/// Errors raised by the execution state machine itself, as distinct from
/// errors recorded on a [`crate::NodeExecution`] (those live in
/// [`ExecutionErrorDetail`]).
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A state transition is not valid for the current status.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: ExecutionStatus,
        /// Attempted target status.
        to: ExecutionStatus,
    },

    /// A referenced node does not exist in the execution graph.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// `resume` was called on an execution that is not suspended.
    #[error("execution is not suspended")]
    NotSuspended,

    /// A serialization or deserialization error.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The execution was cancelled.
    #[error("execution cancelled")]
    Cancelled,
}

impl ExecutionError {
    /// Build an invalid-transition error from two statuses.
    #[must_use]
    pub fn invalid_transition(from: ExecutionStatus, to: ExecutionStatus) -> Self {
        Self::InvalidTransition { from, to }
    }
}
