//! The public evaluator boundary. Everything upstream of this crate talks
//! to [`ExpressionEngine`] only — the grammar in [`crate::eval`] and the
//! marker syntax in [`crate::template`] are private implementation.

use crate::context::EvaluationContext;
use crate::error::ExpressionResult;
use crate::template;
use serde_json::Value;

/// Stateless entry point for rendering templates and evaluating bare
/// expressions against an [`EvaluationContext`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressionEngine;

impl ExpressionEngine {
    /// Create a new engine. Carries no state of its own today; kept as a
    /// type so a future caching layer can slot in without changing call
    /// sites.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render a template string, returning its native type when the whole
    /// string is a single `{{ }}` expression, or a rendered `String`
    /// otherwise.
    pub fn render(&self, source: &str, ctx: &EvaluationContext) -> ExpressionResult<Value> {
        template::render(source, ctx)
    }

    /// Evaluate a bare expression (no `{{ }}` markers) directly, e.g. an
    /// IF node's condition string.
    pub fn evaluate(&self, source: &str, ctx: &EvaluationContext) -> ExpressionResult<Value> {
        crate::eval::evaluate(source, ctx)
    }

    /// Validate that `source` parses without evaluating it. Used at
    /// compile time to reject malformed templates before execution.
    pub fn validate(&self, source: &str) -> ExpressionResult<()> {
        template::scan(source)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionInfo;
    use std::collections::HashMap;

    fn ctx() -> EvaluationContext {
        let mut input = HashMap::new();
        input.insert("age".to_owned(), serde_json::json!(25));
        EvaluationContext::new(
            input,
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
            ExecutionInfo {
                run_index: 0,
                attempt_number: 1,
                execution_id: "e".into(),
                workflow_id: "w".into(),
            },
        )
    }

    #[test]
    fn render_roundtrips_native_type() {
        let engine = ExpressionEngine::new();
        assert_eq!(engine.render("{{ $input.age }}", &ctx()).unwrap(), serde_json::json!(25));
    }

    #[test]
    fn evaluate_bare_condition() {
        let engine = ExpressionEngine::new();
        assert_eq!(
            engine.evaluate("$input.age >= 18", &ctx()).unwrap(),
            serde_json::json!(true)
        );
    }

    #[test]
    fn validate_rejects_unterminated_marker() {
        let engine = ExpressionEngine::new();
        assert!(engine.validate("{{ oops").is_err());
    }

    #[test]
    fn validate_accepts_well_formed_template() {
        let engine = ExpressionEngine::new();
        assert!(engine.validate("hello {{ $input.age }}").is_ok());
    }
}
