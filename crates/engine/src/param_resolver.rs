//! Parameter resolution — resolves a node's raw `ParamValue` tree into the
//! concrete JSON object a handler receives.
//!
//! Only two top-level variants exist (§4.3, §9): a `Literal` passes through
//! as-is *except* that any string leaf nested inside it — through any
//! depth of map/list — is itself scanned for template markers and
//! rendered; a `Template` is a whole-string expression, resolved once at
//! the top level so a single-expression leaf preserves its native type.

use std::collections::HashMap;

use prana_expression::{contains_template_marker, EvaluationContext, ExpressionEngine};
use prana_workflow::ParamValue;
use serde_json::Value;

use crate::error::EngineError;

/// Resolves a node's parameter map against an [`EvaluationContext`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ParamResolver {
    engine: ExpressionEngine,
}

impl ParamResolver {
    /// Build a resolver around a fresh [`ExpressionEngine`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: ExpressionEngine::new(),
        }
    }

    /// Resolve every parameter leaf, returning the JSON object passed to
    /// `execute`/`resume`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if a template fails to render.
    pub fn resolve(&self, params: &HashMap<String, ParamValue>, ctx: &EvaluationContext) -> Result<Value, EngineError> {
        let mut resolved = serde_json::Map::with_capacity(params.len());
        for (name, param) in params {
            let value = match param {
                ParamValue::Literal { value } => self.resolve_nested(value, ctx)?,
                ParamValue::Template { source } => self.engine.render(source, ctx)?,
            };
            resolved.insert(name.clone(), value);
        }
        Ok(Value::Object(resolved))
    }

    /// Recurse into a literal's maps and lists, rendering any string leaf
    /// that contains a template marker (§4.3 "Maps and lists are
    /// recursed") and passing every other leaf through untouched.
    fn resolve_nested(&self, value: &Value, ctx: &EvaluationContext) -> Result<Value, EngineError> {
        match value {
            Value::String(s) if contains_template_marker(s) => self.engine.render(s, ctx).map_err(EngineError::from),
            Value::Array(items) => items.iter().map(|item| self.resolve_nested(item, ctx)).collect::<Result<Vec<_>, _>>().map(Value::Array),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| self.resolve_nested(v, ctx).map(|v| (k.clone(), v)))
                .collect::<Result<serde_json::Map<_, _>, _>>()
                .map(Value::Object),
            other => Ok(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as Map;

    use prana_expression::ExecutionInfo;

    use super::*;

    fn ctx() -> EvaluationContext {
        let mut input = Map::new();
        input.insert("age".to_owned(), serde_json::json!(20));
        EvaluationContext::new(
            input,
            Map::new(),
            Map::new(),
            Map::new(),
            ExecutionInfo {
                run_index: 0,
                attempt_number: 1,
                execution_id: "e1".into(),
                workflow_id: "w1".into(),
            },
        )
    }

    #[test]
    fn literal_passes_through_untouched() {
        let resolver = ParamResolver::new();
        let mut params = HashMap::new();
        params.insert("count".to_string(), ParamValue::literal(serde_json::json!(5)));
        let resolved = resolver.resolve(&params, &ctx()).unwrap();
        assert_eq!(resolved["count"], 5);
    }

    #[test]
    fn template_renders_native_type() {
        let resolver = ParamResolver::new();
        let mut params = HashMap::new();
        params.insert("age".to_string(), ParamValue::template("{{ $input.age }}"));
        let resolved = resolver.resolve(&params, &ctx()).unwrap();
        assert_eq!(resolved["age"], 20);
    }

    #[test]
    fn mixed_literal_and_expression_stringifies() {
        let resolver = ParamResolver::new();
        let mut params = HashMap::new();
        params.insert("label".to_string(), ParamValue::template("age: {{ $input.age }}"));
        let resolved = resolver.resolve(&params, &ctx()).unwrap();
        assert_eq!(resolved["label"], "age: 20");
    }

    #[test]
    fn unknown_root_in_template_errors() {
        let resolver = ParamResolver::new();
        let mut params = HashMap::new();
        params.insert("x".to_string(), ParamValue::template("{{ $bogus.y }}"));
        assert!(resolver.resolve(&params, &ctx()).is_err());
    }

    #[test]
    fn literal_recurses_into_nested_maps_and_lists() {
        let resolver = ParamResolver::new();
        let mut params = HashMap::new();
        params.insert(
            "request".to_string(),
            ParamValue::literal(serde_json::json!({
                "headers": { "authorization": "Bearer {{ $input.age }}" },
                "tags": ["static", "age-{{ $input.age }}"],
            })),
        );
        let resolved = resolver.resolve(&params, &ctx()).unwrap();
        assert_eq!(resolved["request"]["headers"]["authorization"], "Bearer 20");
        assert_eq!(resolved["request"]["tags"][0], "static");
        assert_eq!(resolved["request"]["tags"][1], "age-20");
    }
}
