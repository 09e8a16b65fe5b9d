use thiserror::Error;

/// Stable, cross-crate error kind identifiers (see §7 of the design notes).
///
/// Every higher-level error type in the workspace carries one of these so a
/// caller several layers away from the failure site can still branch on
/// `kind()` without downcasting through a chain of `source()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Structural problem in a workflow definition; execution never starts.
    CompileError,
    /// An action type had no registered handler.
    HandlerNotFound,
    /// Resolved parameters failed schema validation.
    ParameterError,
    /// The template evaluator raised an error.
    ExpressionError,
    /// A handler reported a domain-level failure.
    ActionError,
    /// A non-suspendable handler returned a suspend result.
    SuspendNotPermitted,
    /// Retries were exhausted without a successful attempt.
    RetryExhausted,
    /// A loop exceeded its configured iteration guard.
    MaxIterationsExceeded,
    /// The execution was cancelled by its caller.
    Cancelled,
}

impl ErrorKind {
    /// Machine-stable identifier, suitable for metrics labels and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompileError => "compile_error",
            Self::HandlerNotFound => "handler_not_found",
            Self::ParameterError => "parameter_error",
            Self::ExpressionError => "expression_error",
            Self::ActionError => "action_error",
            Self::SuspendNotPermitted => "suspend_not_permitted",
            Self::RetryExhausted => "retry_exhausted",
            Self::MaxIterationsExceeded => "max_iterations_exceeded",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catch-all error for the small amount of fallible logic living in
/// `prana-core` itself (today: identifier parsing).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A string could not be parsed into one of the identifier types.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] domain_key::KeyParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_as_str_is_snake_case() {
        assert_eq!(ErrorKind::CompileError.as_str(), "compile_error");
        assert_eq!(ErrorKind::RetryExhausted.as_str(), "retry_exhausted");
    }

    #[test]
    fn error_kind_display_matches_as_str() {
        assert_eq!(ErrorKind::Cancelled.to_string(), "cancelled");
    }
}
