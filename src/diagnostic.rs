//! Structured diagnostics returned by validation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of characters shown in a `near` excerpt.
pub const NEAR_LEN: usize = 20;

/// Machine-readable diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Lexical or grammatical malformation
    #[serde(rename = "DSL_PARSE_ERROR")]
    ParseError,
    /// Field not present in the catalog, or an operand that must be a field is not
    #[serde(rename = "DSL_INVALID_FIELD")]
    InvalidField,
    /// Operator not allowed for the field's kind
    #[serde(rename = "DSL_INVALID_OPERATOR")]
    InvalidOperator,
    /// Construct the language deliberately does not support (functions, arithmetic)
    #[serde(rename = "DSL_UNSUPPORTED_TIER")]
    UnsupportedTier,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::ParseError => "DSL_PARSE_ERROR",
            DiagnosticCode::InvalidField => "DSL_INVALID_FIELD",
            DiagnosticCode::InvalidOperator => "DSL_INVALID_OPERATOR",
            DiagnosticCode::UnsupportedTier => "DSL_UNSUPPORTED_TIER",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation finding, attributed to a position in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    pub position: usize,
    pub near: String,
}

impl Diagnostic {
    /// Builds a diagnostic whose `near` excerpt is taken from `source` at `position`.
    pub fn at(
        code: DiagnosticCode,
        message: impl Into<String>,
        source: &str,
        position: usize,
    ) -> Self {
        Diagnostic {
            code,
            message: message.into(),
            position,
            near: near(source, position),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at position {} near '{}'",
            self.code, self.message, self.position, self.near
        )
    }
}

/// Up to [`NEAR_LEN`] characters of `source` starting at the character offset `position`.
pub fn near(source: &str, position: usize) -> String {
    source.chars().skip(position).take(NEAR_LEN).collect()
}
