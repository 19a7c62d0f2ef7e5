//! Syntax error types for lexing and parsing.
//!
//! All variants carry the 0-based source line index where the failure was
//! detected; messages display lines 1-based for humans. Errors are values,
//! never panics -- the tracer folds them into an empty, finished trace.

use thiserror::Error;

/// Errors produced while lexing or parsing a script.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    /// A character sequence no token rule matches.
    #[error("line {}: unrecognized token '{text}'", .line + 1)]
    InvalidToken { line: usize, text: String },

    /// A tab character in leading indentation (only spaces are accepted).
    #[error("line {}: tab character in indentation", .line + 1)]
    TabIndent { line: usize },

    /// A line indented deeper than its block allows.
    #[error("line {}: unexpected indent", .line + 1)]
    UnexpectedIndent { line: usize },

    /// A compound statement header with no indented body after it.
    #[error("line {}: expected an indented block", .line + 1)]
    ExpectedBlock { line: usize },

    /// The parser needed one token and found another.
    #[error("line {}: expected {expected}, found {found}", .line + 1)]
    Expected {
        line: usize,
        expected: String,
        found: String,
    },

    /// A bracketed expression left unclosed at end of input.
    #[error("line {}: unclosed bracket", .line + 1)]
    UnclosedBracket { line: usize },

    /// A structurally invalid construct (bad assignment target, stray
    /// `elif`, `return` outside a function, and similar).
    #[error("line {}: {message}", .line + 1)]
    Invalid { line: usize, message: String },

    /// Input ended while a statement was incomplete.
    #[error("unexpected end of input")]
    UnexpectedEof,
}

impl SyntaxError {
    /// The 0-based source line the error refers to (last line for EOF).
    pub fn line(&self) -> Option<usize> {
        match self {
            SyntaxError::InvalidToken { line, .. }
            | SyntaxError::TabIndent { line }
            | SyntaxError::UnexpectedIndent { line }
            | SyntaxError::ExpectedBlock { line }
            | SyntaxError::Expected { line, .. }
            | SyntaxError::UnclosedBracket { line }
            | SyntaxError::Invalid { line, .. } => Some(*line),
            SyntaxError::UnexpectedEof => None,
        }
    }
}
