use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ActionContext;
use crate::error::ActionError;

/// Whether a handler starts workflows or performs work within one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// An event source that starts an execution (webhook, schedule, manual trigger).
    Trigger,
    /// A node that performs work given upstream input.
    Action,
}

/// Declarative constraint on one parameter field, used to validate
/// resolved params before `execute` is called.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamField {
    /// JSON-ish type name (`"string"`, `"number"`, `"boolean"`, `"object"`, `"array"`).
    #[serde(rename = "type")]
    pub field_type: String,
    /// Whether the field must be present.
    #[serde(default)]
    pub required: bool,
    /// Default value substituted when the field is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values, if the field is constrained to an enumeration.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
}

/// A handler's declared parameter schema: field name to constraint.
pub type ParamsSchema = HashMap<String, ParamField>;

/// A single field-level validation failure from `validate_params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl FieldError {
    /// Construct a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Successful or suspending outcome of `execute`/`resume`.
///
/// Errors are reported out-of-band via `Result`'s `Err` arm, wrapped in
/// [`HandlerFailure`] so a handler can still steer error-port routing.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// Successful completion.
    Success {
        /// Output value to hand to dependent nodes.
        output: Value,
        /// Output port to emit on. `None` means the handler's default
        /// success port (first of `output_ports`, or `"main"`).
        port: Option<String>,
    },
    /// Pause until an external event resumes this node. Only legal when
    /// the handler declares `suspendable() == true`.
    Suspend {
        /// Suspension kind surfaced to the outside scheduler (e.g. `"webhook"`).
        kind: String,
        /// Opaque payload the outside scheduler needs to eventually resume.
        data: Value,
    },
}

impl HandlerOutcome {
    /// Build a success outcome on the handler's default port.
    #[must_use]
    pub fn ok(output: Value) -> Self {
        Self::Success { output, port: None }
    }

    /// Build a success outcome on an explicit output port.
    #[must_use]
    pub fn ok_on_port(output: Value, port: impl Into<String>) -> Self {
        Self::Success {
            output,
            port: Some(port.into()),
        }
    }

    /// Build a suspend outcome.
    #[must_use]
    pub fn suspend(kind: impl Into<String>, data: Value) -> Self {
        Self::Suspend {
            kind: kind.into(),
            data,
        }
    }
}

/// An `ActionError` paired with the output port the error should be
/// routed to, if the handler has an opinion. The node executor falls
/// back to the handler's declared error port (if any) when `port` is
/// `None`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct HandlerFailure {
    /// The underlying error.
    pub error: ActionError,
    /// Explicit output port to route the error payload to, overriding
    /// the handler's declared error port.
    pub port: Option<String>,
}

impl HandlerFailure {
    /// Wrap an error with no explicit port.
    pub fn new(error: ActionError) -> Self {
        Self { error, port: None }
    }

    /// Wrap an error with an explicit output port.
    pub fn on_port(error: ActionError, port: impl Into<String>) -> Self {
        Self {
            error,
            port: Some(port.into()),
        }
    }
}

impl From<ActionError> for HandlerFailure {
    fn from(error: ActionError) -> Self {
        Self::new(error)
    }
}

/// Result type returned by `execute`/`resume`/`prepare`.
pub type HandlerResult = Result<HandlerOutcome, HandlerFailure>;

/// The contract every trigger and action implementation satisfies.
///
/// The node executor calls `prepare` once per execution (on `run_index
/// == 0`), then `execute` (or, on a non-retry resume, `resume`) on every
/// invocation. `input_ports`/`output_ports` and `suspendable` are static
/// declarations read by the Action Registry and Graph Compiler; they
/// must not depend on runtime state.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Whether this handler is a trigger or an ordinary action.
    fn kind(&self) -> HandlerKind;

    /// Declared input port names.
    fn input_ports(&self) -> &[String];

    /// Declared output port names. `["*"]` permits emitting any port name.
    fn output_ports(&self) -> &[String];

    /// Optional declarative parameter schema.
    fn params_schema(&self) -> Option<&ParamsSchema> {
        None
    }

    /// Whether this handler may return `HandlerOutcome::Suspend`.
    fn suspendable(&self) -> bool {
        false
    }

    /// Output port an unrecovered error should be routed to, if the node
    /// type has one wired in the graph (e.g. `"error"`). `None` means
    /// errors never recover onto an output port for this handler.
    fn error_port(&self) -> Option<&str> {
        None
    }

    /// Called once per execution, before the first `execute`, if the
    /// handler needs to establish per-execution state.
    fn prepare(&self, _node_key: &str) -> Result<Value, ActionError> {
        Ok(Value::Null)
    }

    /// Run the handler with resolved params and context.
    async fn execute(&self, params: Value, ctx: &ActionContext) -> HandlerResult;

    /// Resume a suspended (non-retry) invocation. Required for any
    /// handler with `suspendable() == true`; the default rejects the
    /// call as a programming error.
    async fn resume(&self, params: Value, ctx: &ActionContext, resume_data: Value) -> HandlerResult {
        let _ = (params, ctx, resume_data);
        Err(ActionError::fatal("handler does not implement resume").into())
    }

    /// Validate raw params before template resolution. The default
    /// accepts everything unchanged.
    fn validate_params(&self, raw: &Value) -> Result<Value, Vec<FieldError>> {
        Ok(raw.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_uses_default_port() {
        let outcome = HandlerOutcome::ok(serde_json::json!(1));
        assert_eq!(
            outcome,
            HandlerOutcome::Success {
                output: serde_json::json!(1),
                port: None,
            }
        );
    }

    #[test]
    fn ok_on_port_carries_explicit_port() {
        let outcome = HandlerOutcome::ok_on_port(serde_json::json!(true), "true_branch");
        match outcome {
            HandlerOutcome::Success { port, .. } => assert_eq!(port.as_deref(), Some("true_branch")),
            _ => panic!("expected Success"),
        }
    }

    #[test]
    fn suspend_carries_kind_and_data() {
        let outcome = HandlerOutcome::suspend("webhook", serde_json::json!({"id": "w1"}));
        match outcome {
            HandlerOutcome::Suspend { kind, data } => {
                assert_eq!(kind, "webhook");
                assert_eq!(data, serde_json::json!({"id": "w1"}));
            }
            _ => panic!("expected Suspend"),
        }
    }

    #[test]
    fn handler_failure_from_action_error_has_no_port() {
        let failure: HandlerFailure = ActionError::fatal("boom").into();
        assert!(failure.port.is_none());
    }

    #[test]
    fn handler_failure_on_port() {
        let failure = HandlerFailure::on_port(ActionError::fatal("boom"), "error");
        assert_eq!(failure.port.as_deref(), Some("error"));
    }

    #[test]
    fn field_error_constructor() {
        let err = FieldError::new("age", "must be a number");
        assert_eq!(err.field, "age");
        assert_eq!(err.message, "must be a number");
    }
}
