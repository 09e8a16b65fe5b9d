use std::sync::Arc;

use parking_lot::RwLock;
use prana_core::{ExecutionId, NodeKey, WorkflowId};
use tokio_util::sync::CancellationToken;

use crate::error::ActionError;

/// Runtime context handed to a handler's `prepare`/`execute`/`resume` call.
///
/// Constructed by the node executor from the execution's runtime state
/// before invoking a handler. Carries identity information and the
/// workflow-scoped `$vars` map; the `$input`/`$nodes`/`$env`/`$execution`
/// values have already been folded into the resolved `params` the handler
/// receives.
///
/// Handlers **should** call [`check_cancelled`](Self::check_cancelled) in
/// long-running loops to support cooperative cancellation.
#[non_exhaustive]
pub struct ActionContext {
    /// Execution this invocation belongs to.
    pub execution_id: ExecutionId,
    /// Node being executed.
    pub node_key: NodeKey,
    /// Workflow the node belongs to.
    pub workflow_id: WorkflowId,
    /// Cancellation signal — checked cooperatively by handlers.
    pub cancellation: CancellationToken,
    /// Workflow-scoped variables (`$vars`), shared across every node in
    /// this execution.
    variables: Arc<RwLock<serde_json::Map<String, serde_json::Value>>>,
}

impl ActionContext {
    /// Create a new context with the given identifiers.
    #[must_use]
    pub fn new(execution_id: ExecutionId, node_key: NodeKey, workflow_id: WorkflowId) -> Self {
        Self {
            execution_id,
            node_key,
            workflow_id,
            cancellation: CancellationToken::new(),
            variables: Arc::new(RwLock::new(serde_json::Map::new())),
        }
    }

    /// Attach a pre-existing cancellation token, e.g. a child of the
    /// execution's own token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Attach pre-populated workflow variables.
    #[must_use]
    pub fn with_variables(mut self, vars: serde_json::Map<String, serde_json::Value>) -> Self {
        self.variables = Arc::new(RwLock::new(vars));
        self
    }

    /// Read a variable from `$vars`. Returns `None` if absent.
    #[must_use]
    pub fn get_variable(&self, key: &str) -> Option<serde_json::Value> {
        self.variables.read().get(key).cloned()
    }

    /// Write a variable to `$vars`, overwriting any existing value.
    pub fn set_variable(&self, key: &str, value: serde_json::Value) {
        self.variables.write().insert(key.to_owned(), value);
    }

    /// Snapshot the full `$vars` map, e.g. for the context builder.
    #[must_use]
    pub fn variables_snapshot(&self) -> serde_json::Map<String, serde_json::Value> {
        self.variables.read().clone()
    }

    /// Check whether the execution has been cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Cancelled`] once the token has been triggered.
    pub fn check_cancelled(&self) -> Result<(), ActionError> {
        if self.cancellation.is_cancelled() {
            Err(ActionError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("execution_id", &self.execution_id)
            .field("node_key", &self.node_key)
            .field("workflow_id", &self.workflow_id)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_context() -> ActionContext {
        ActionContext::new(ExecutionId::v4(), NodeKey::new("n1").unwrap(), WorkflowId::v4())
    }

    #[test]
    fn get_set_variable() {
        let ctx = test_context();
        assert!(ctx.get_variable("count").is_none());
        ctx.set_variable("count", serde_json::json!(42));
        assert_eq!(ctx.get_variable("count"), Some(serde_json::json!(42)));
    }

    #[test]
    fn overwrite_variable() {
        let ctx = test_context();
        ctx.set_variable("name", serde_json::json!("alice"));
        ctx.set_variable("name", serde_json::json!("bob"));
        assert_eq!(ctx.get_variable("name"), Some(serde_json::json!("bob")));
    }

    #[test]
    fn variables_snapshot_reflects_writes() {
        let ctx = test_context();
        ctx.set_variable("a", serde_json::json!(1));
        let snap = ctx.variables_snapshot();
        assert_eq!(snap.get("a"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn check_cancelled_ok() {
        assert!(test_context().check_cancelled().is_ok());
    }

    #[test]
    fn check_cancelled_after_cancel() {
        let ctx = test_context();
        ctx.cancellation.cancel();
        assert!(matches!(ctx.check_cancelled(), Err(ActionError::Cancelled)));
    }

    #[test]
    fn with_cancellation_token_propagates_from_parent() {
        let token = CancellationToken::new();
        let child = token.child_token();
        let ctx = test_context().with_cancellation(child);
        assert!(ctx.check_cancelled().is_ok());
        token.cancel();
        assert!(ctx.check_cancelled().is_err());
    }

    #[test]
    fn with_variables_preloads_map() {
        let mut vars = serde_json::Map::new();
        vars.insert("preset".into(), serde_json::json!("value"));
        let ctx = test_context().with_variables(vars);
        assert_eq!(ctx.get_variable("preset"), Some(serde_json::json!("value")));
    }

    #[test]
    fn debug_format() {
        let debug = format!("{:?}", test_context());
        assert!(debug.contains("ActionContext"));
        assert!(debug.contains("execution_id"));
    }
}
