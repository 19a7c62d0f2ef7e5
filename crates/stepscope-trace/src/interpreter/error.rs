//! Runtime error types with trap semantics for the script interpreter.
//!
//! Every variant carries the 0-based source line of the statement that was
//! executing, so the tracer can attach a final snapshot to the failing line.
//! Messages display lines 1-based. No error escapes trace construction --
//! the tracer folds them into the trace and marks the run finished.

use thiserror::Error;

/// Runtime errors produced by the interpreter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("line {}: division by zero", .line + 1)]
    DivisionByZero { line: usize },

    #[error("line {}: integer overflow", .line + 1)]
    IntegerOverflow { line: usize },

    #[error("line {}: name '{name}' is not defined", .line + 1)]
    NameNotDefined { name: String, line: usize },

    #[error("line {}: unsupported operand type(s) for {op}: '{lhs}' and '{rhs}'", .line + 1)]
    UnsupportedOp {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
        line: usize,
    },

    #[error("line {}: bad operand type for unary {op}: '{operand}'", .line + 1)]
    UnsupportedUnary {
        op: &'static str,
        operand: &'static str,
        line: usize,
    },

    #[error("line {}: '{type_name}' object is not iterable", .line + 1)]
    NotIterable { type_name: &'static str, line: usize },

    #[error("line {}: '{type_name}' object is not callable", .line + 1)]
    NotCallable { type_name: &'static str, line: usize },

    #[error("line {}: '{type_name}' object is not subscriptable", .line + 1)]
    NotSubscriptable { type_name: &'static str, line: usize },

    #[error("line {}: '{type_name}' object does not support item assignment", .line + 1)]
    NoItemAssignment { type_name: &'static str, line: usize },

    #[error("line {}: index {index} out of range for length {len}", .line + 1)]
    IndexOutOfBounds { index: i64, len: usize, line: usize },

    #[error("line {}: key {key} not found", .line + 1)]
    KeyNotFound { key: String, line: usize },

    #[error("line {}: unsupported dict key type '{type_name}'", .line + 1)]
    BadKey { type_name: &'static str, line: usize },

    #[error("line {}: {name}() takes {expected} arguments but {got} were given", .line + 1)]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("line {}: {message}", .line + 1)]
    BadArgument { message: String, line: usize },

    #[error("line {}: no more items in iterator", .line + 1)]
    IteratorExhausted { line: usize },

    #[error("line {}: cannot unpack {got} values into {expected} targets", .line + 1)]
    CannotUnpack {
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("line {}: sequence of length {len} is too large to materialize", .line + 1)]
    TooLarge { len: usize, line: usize },

    #[error("line {}: recursion depth limit ({limit}) exceeded", .line + 1)]
    RecursionLimitExceeded { limit: usize, line: usize },

    #[error("line {}: execution budget of {limit} statements exceeded", .line + 1)]
    BudgetExceeded { limit: usize, line: usize },
}

impl RuntimeError {
    /// The 0-based source line the error occurred on.
    pub fn line(&self) -> usize {
        match self {
            RuntimeError::DivisionByZero { line }
            | RuntimeError::IntegerOverflow { line }
            | RuntimeError::NameNotDefined { line, .. }
            | RuntimeError::UnsupportedOp { line, .. }
            | RuntimeError::UnsupportedUnary { line, .. }
            | RuntimeError::NotIterable { line, .. }
            | RuntimeError::NotCallable { line, .. }
            | RuntimeError::NotSubscriptable { line, .. }
            | RuntimeError::NoItemAssignment { line, .. }
            | RuntimeError::IndexOutOfBounds { line, .. }
            | RuntimeError::KeyNotFound { line, .. }
            | RuntimeError::BadKey { line, .. }
            | RuntimeError::WrongArity { line, .. }
            | RuntimeError::BadArgument { line, .. }
            | RuntimeError::IteratorExhausted { line }
            | RuntimeError::CannotUnpack { line, .. }
            | RuntimeError::TooLarge { line, .. }
            | RuntimeError::RecursionLimitExceeded { line, .. }
            | RuntimeError::BudgetExceeded { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_one_based() {
        let err = RuntimeError::DivisionByZero { line: 1 };
        assert_eq!(err.to_string(), "line 2: division by zero");
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn budget_message_is_distinct() {
        let err = RuntimeError::BudgetExceeded { limit: 100, line: 3 };
        assert!(err.to_string().contains("execution budget"));
    }
}
