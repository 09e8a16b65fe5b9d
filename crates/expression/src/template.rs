//! Template scanning and rendering: `{{ expr }}` markers embedded in a
//! literal string, with `{{-`/`-}}` stripping adjacent whitespace.
//!
//! A template that is *entirely* a single `{{ ... }}` expression preserves
//! the expression's native JSON type (a number stays a number). Anything
//! with surrounding literal text, or more than one marker, is rendered to
//! a string.

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::error::{ExpressionError, ExpressionResult};
use crate::eval::evaluate;

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Literal(String),
    Expression(String),
}

/// Scan `source` once, splitting it into literal and expression parts.
/// Called at workflow compile time so that rendering never re-scans.
pub(crate) fn scan(source: &str) -> ExpressionResult<Vec<Part>> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let bytes = source.as_bytes();
    let mut i = 0;
    let mut lit_start = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' && bytes.get(i + 1) == Some(&b'{') {
            literal.push_str(&source[lit_start..i]);

            let trim_left = bytes.get(i + 2) == Some(&b'-');
            let expr_start = if trim_left { i + 3 } else { i + 2 };
            let Some(close_rel) = source[expr_start..].find("}}") else {
                return Err(ExpressionError::UnterminatedExpression { offset: i });
            };
            let mut expr_end = expr_start + close_rel;
            let trim_right = expr_end >= 1 && bytes.get(expr_end - 1) == Some(&b'-');
            let expr_text_end = if trim_right { expr_end - 1 } else { expr_end };
            let expr = source[expr_start..expr_text_end].trim().to_owned();

            if trim_left {
                while literal.ends_with(|c: char| c.is_whitespace()) {
                    literal.pop();
                }
            }
            if !literal.is_empty() {
                parts.push(Part::Literal(std::mem::take(&mut literal)));
            }
            parts.push(Part::Expression(expr));

            expr_end += 2; // consume closing `}}`
            i = expr_end;
            if trim_right {
                let rest = &source[i..];
                let trimmed = rest.trim_start();
                i += rest.len() - trimmed.len();
            }
            lit_start = i;
        } else {
            i += 1;
        }
    }
    literal.push_str(&source[lit_start..i]);
    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }
    Ok(parts)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a template against `ctx`. A template made of exactly one
/// expression part (no literal text) returns the expression's native
/// value; otherwise every expression part is stringified and concatenated
/// with the surrounding literal text.
pub(crate) fn render(source: &str, ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let parts = scan(source)?;
    if let [Part::Expression(expr)] = parts.as_slice() {
        return evaluate(expr, ctx);
    }
    let mut out = String::new();
    for part in &parts {
        match part {
            Part::Literal(s) => out.push_str(s),
            Part::Expression(expr) => out.push_str(&stringify(&evaluate(expr, ctx)?)),
        }
    }
    Ok(Value::String(out))
}

/// Whether `source` contains at least one `{{ ... }}` marker. Used by the
/// parameter resolver to skip literal values without scanning them.
#[must_use]
pub fn contains_template_marker(source: &str) -> bool {
    source.contains("{{")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionInfo;
    use std::collections::HashMap;

    fn ctx() -> EvaluationContext {
        let mut input = HashMap::new();
        input.insert("name".to_owned(), serde_json::json!("Ada"));
        input.insert("age".to_owned(), serde_json::json!(30));
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
    fn pure_literal_passes_through() {
        assert_eq!(render("hello", &ctx()).unwrap(), serde_json::json!("hello"));
    }

    #[test]
    fn single_expression_preserves_type() {
        assert_eq!(render("{{ $input.age }}", &ctx()).unwrap(), serde_json::json!(30));
    }

    #[test]
    fn mixed_literal_and_expression_stringifies() {
        assert_eq!(
            render("hi {{ $input.name }}!", &ctx()).unwrap(),
            serde_json::json!("hi Ada!")
        );
    }

    #[test]
    fn single_expression_null_yields_json_null() {
        assert_eq!(render("{{ $input.missing }}", &ctx()).unwrap(), Value::Null);
    }

    #[test]
    fn trim_markers_strip_adjacent_whitespace() {
        assert_eq!(
            render("a \n{{- $input.name -}}\n b", &ctx()).unwrap(),
            serde_json::json!("aAdab")
        );
    }

    #[test]
    fn unterminated_expression_errors() {
        assert!(matches!(
            render("{{ $input.age", &ctx()),
            Err(ExpressionError::UnterminatedExpression { .. })
        ));
    }

    #[test]
    fn multibyte_literal_text_is_preserved() {
        assert_eq!(
            render("hola {{ $input.name }} señor", &ctx()).unwrap(),
            serde_json::json!("hola Ada señor")
        );
    }

    #[test]
    fn detects_marker_presence() {
        assert!(contains_template_marker("{{ x }}"));
        assert!(!contains_template_marker("plain"));
    }
}
