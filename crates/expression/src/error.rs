use thiserror::Error;

/// Errors raised while parsing or evaluating a template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExpressionError {
    /// The template contained unbalanced `{{`/`}}` markers.
    #[error("unterminated expression starting at offset {offset}")]
    UnterminatedExpression {
        /// Character offset where the opening `{{` was found.
        offset: usize,
    },

    /// The expression inside `{{ }}` could not be parsed.
    #[error("parse error in expression `{source_text}`: {message}")]
    Parse {
        /// The raw expression source (without the surrounding markers).
        source_text: String,
        /// Human-readable description of the parse failure.
        message: String,
    },

    /// Evaluation failed after a successful parse (e.g. unknown path,
    /// type mismatch, division by zero).
    #[error("evaluation error in expression `{source_text}`: {message}")]
    Evaluation {
        /// The raw expression source (without the surrounding markers).
        source_text: String,
        /// Human-readable description of the failure.
        message: String,
    },
}

impl ExpressionError {
    pub(crate) fn parse(source_text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_text: source_text.into(),
            message: message.into(),
        }
    }

    pub(crate) fn eval(source_text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Evaluation {
            source_text: source_text.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type ExpressionResult<T> = std::result::Result<T, ExpressionError>;
