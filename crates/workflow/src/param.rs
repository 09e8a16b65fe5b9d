use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node parameter's raw, unresolved value.
///
/// Exactly two shapes exist — a static literal or a template string — so
/// the resolver's job is a single branch: literals pass through untouched,
/// templates are scanned once at compile time and rendered per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamValue {
    /// Used as-is; never passed through the expression evaluator.
    Literal {
        /// The literal JSON value.
        value: Value,
    },
    /// Scanned for `{{ }}` markers and rendered against the evaluation
    /// context on every invocation.
    Template {
        /// The raw template source.
        source: String,
    },
}

impl ParamValue {
    /// Construct a literal parameter.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal { value: value.into() }
    }

    /// Construct a template parameter.
    #[must_use]
    pub fn template(source: impl Into<String>) -> Self {
        Self::Template { source: source.into() }
    }

    /// Whether this is a literal value.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_roundtrips_through_json() {
        let param = ParamValue::literal(serde_json::json!(42));
        let json = serde_json::to_value(&param).unwrap();
        let back: ParamValue = serde_json::from_value(json).unwrap();
        assert_eq!(param, back);
    }

    #[test]
    fn template_roundtrips_through_json() {
        let param = ParamValue::template("{{ $input.age }}");
        let json = serde_json::to_value(&param).unwrap();
        let back: ParamValue = serde_json::from_value(json).unwrap();
        assert_eq!(param, back);
    }

    #[test]
    fn is_literal() {
        assert!(ParamValue::literal(serde_json::json!(1)).is_literal());
        assert!(!ParamValue::template("x").is_literal());
    }
}
