use serde::{Deserialize, Serialize};
use std::fmt;

/// A malformed scenario line: unbalanced parentheses or an unterminated
/// quoted literal. Line and column are 1-based; the column counts
/// characters, not bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Re-home an error produced for a single line at its position in a
    /// larger script.
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "column":  self.column,
            "line":    self.line,
            "message": self.message,
        })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}
