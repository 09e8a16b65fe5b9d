//! # Prana Expression
//!
//! The template and expression evaluator used by the parameter resolver.
//! Deliberately small and treated as an opaque boundary by the rest of
//! the engine: callers only see [`ExpressionEngine`], [`EvaluationContext`],
//! and [`ExpressionError`].

mod context;
mod engine;
mod error;
mod eval;
mod template;
mod value;

pub use context::{EvaluationContext, ExecutionInfo, NodeSnapshot};
pub use engine::ExpressionEngine;
pub use error::{ExpressionError, ExpressionResult};
pub use template::contains_template_marker;
pub use value::{is_truthy, value_type_name};
