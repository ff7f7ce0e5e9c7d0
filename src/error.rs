//! Error types and result aliases for rbeautify.
//!
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used by the file and CLI layers
//! - [`ParseError`]: Located diagnostic for input no line shape could match

use anyhow::Result as AnyhowResult;
use thiserror::Error;

use crate::parser::position::{column_of, line_of, line_text};

pub type Result<T> = AnyhowResult<T>;

/// Furthest failed rule of a parse, with its location in the input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: failed rule '{rule}'")]
pub struct ParseError {
    /// Name of the rule that failed furthest into the input
    pub rule: String,
    /// Byte offset of the failure
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column, in characters
    pub column: usize,
    /// The offending line, without its newline
    pub source_line: String,
}

impl ParseError {
    #[must_use]
    pub fn at(input: &str, rule: &str, offset: usize) -> Self {
        Self {
            rule: rule.to_string(),
            offset,
            line: line_of(input, offset),
            column: column_of(input, offset),
            source_line: line_text(input, offset).to_string(),
        }
    }

    /// The offending line with a `^` under the failing column
    #[must_use]
    pub fn caret(&self) -> String {
        format!(
            "{}\n{}^",
            self.source_line,
            " ".repeat(self.column.saturating_sub(1))
        )
    }
}
