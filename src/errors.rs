//! The crate-wide error taxonomy. One variant per class of failure a query
//! can surface to its caller; each carries the structured context needed
//! to render a useful message without string-matching on variant content.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("type mismatch: expected {expected}, found {found} in {op}")]
    TypeMismatch { expected: String, found: String, op: String },

    #[error("invalid property value for `{attribute}`: {reason}")]
    InvalidPropertyValue { attribute: String, reason: String },

    #[error("invalid argument to `{function}`: {reason}")]
    InvalidArgument { function: String, reason: String },

    #[error("constraint violation on schema `{schema}` attributes {attrs:?}: {reason}")]
    ConstraintViolation { schema: String, attrs: Vec<String>, reason: String },

    #[error("runtime error: {0}")]
    RuntimeError(String),

    #[error("query timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    #[error("query cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl QueryError {
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>, op: impl Into<String>) -> Self {
        QueryError::TypeMismatch { expected: expected.into(), found: found.into(), op: op.into() }
    }

    pub fn invalid_argument(function: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidArgument { function: function.into(), reason: reason.into() }
    }

    pub fn constraint_violation(
        schema: impl Into<String>,
        attrs: Vec<String>,
        reason: impl Into<String>,
    ) -> Self {
        QueryError::ConstraintViolation { schema: schema.into(), attrs, reason: reason.into() }
    }

    /// `true` for errors a caller can retry verbatim (timeouts,
    /// cancellation) as opposed to ones that need the query rewritten.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::Timeout { .. } | QueryError::Cancelled)
    }
}

impl From<crate::value::ops::ArithmeticTypeError> for QueryError {
    fn from(e: crate::value::ops::ArithmeticTypeError) -> Self {
        QueryError::type_mismatch("numeric or string operand", format!("{} {} {}", e.lhs, e.op, e.rhs), e.op)
    }
}

impl From<crate::value::ops::ArithmeticError> for QueryError {
    fn from(e: crate::value::ops::ArithmeticError) -> Self {
        match e {
            crate::value::ops::ArithmeticError::TypeMismatch(inner) => inner.into(),
            crate::value::ops::ArithmeticError::DivideByZero(inner) => {
                QueryError::RuntimeError(format!("division by zero in `{}`", inner.op))
            }
        }
    }
}

impl From<crate::pure::btree::BTreeError> for QueryError {
    fn from(e: crate::pure::btree::BTreeError) -> Self {
        QueryError::Internal(format!("index corruption: {e}"))
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_cancelled_are_retryable() {
        assert!(QueryError::Timeout { elapsed_ms: 10, limit_ms: 5 }.is_retryable());
        assert!(QueryError::Cancelled.is_retryable());
    }

    #[test]
    fn type_mismatch_is_not_retryable() {
        assert!(!QueryError::type_mismatch("int", "string", "+").is_retryable());
    }

    #[test]
    fn arithmetic_error_converts_to_type_mismatch() {
        let arith = crate::value::ops::ArithmeticTypeError { op: "+", lhs: "string", rhs: "integer" };
        let err: QueryError = arith.into();
        assert!(matches!(err, QueryError::TypeMismatch { .. }));
    }
}
