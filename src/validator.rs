//! Rule-authoring validation.
//!
//! Validation runs the same lexer and parser the evaluator relies on, then
//! checks every comparison against the field catalog. The first problem found
//! is returned; there is never more than one diagnostic per call.

use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ast::{Expr, Operand, Token, TokenKind},
    catalog::{FieldCatalog, FieldKind},
    diagnostic::{Diagnostic, DiagnosticCode},
    lexer::tokenize,
    parser::Parser,
};

/// String literal (possibly unterminated), identifier-like word, or whitespace run.
static SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)'(?:\\.|[^'\\])*'?|[\p{Alphabetic}_][\p{Alphabetic}\p{N}_.]*|\s+")
        .expect("segment pattern is valid")
});

const ARITHMETIC: [&str; 5] = ["+", "-", "*", "/", "%"];

/// Length bounds applied to the trimmed expression, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        ValidationLimits {
            min_length: 3,
            max_length: 2000,
        }
    }
}

/// Outcome of [`Validator::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub normalized_expression: Option<String>,
    pub errors: Vec<Diagnostic>,
}

impl ValidationResult {
    fn valid(normalized: String) -> Self {
        ValidationResult {
            is_valid: true,
            normalized_expression: Some(normalized),
            errors: Vec::new(),
        }
    }

    fn invalid(diagnostic: Diagnostic) -> Self {
        ValidationResult {
            is_valid: false,
            normalized_expression: None,
            errors: vec![diagnostic],
        }
    }

    /// The single diagnostic of a rejected expression.
    pub fn error(&self) -> Option<&Diagnostic> {
        self.errors.first()
    }
}

/// Canonical text form of an expression: whitespace runs collapsed to one
/// space, ends trimmed, and `and`/`or`/`not` uppercased. Quoted literals are
/// left exactly as written.
pub fn normalize(source: &str) -> String {
    let normalized = SEGMENT.replace_all(source, |caps: &Captures| {
        let segment = &caps[0];
        if segment.starts_with('\'') {
            segment.to_string()
        } else if segment.chars().all(char::is_whitespace) {
            " ".to_string()
        } else {
            let upper = segment.to_uppercase();
            match upper.as_str() {
                "AND" | "OR" | "NOT" => upper,
                _ => segment.to_string(),
            }
        }
    });
    normalized.trim().to_string()
}

pub struct Validator {
    catalog: Arc<FieldCatalog>,
    limits: ValidationLimits,
}

impl Validator {
    pub fn new(catalog: Arc<FieldCatalog>) -> Self {
        Validator {
            catalog,
            limits: ValidationLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn limits(&self) -> ValidationLimits {
        self.limits
    }

    /// Validates `source` and returns its canonical form. Diagnostic positions
    /// refer to `source` as given, not to the normalized text.
    pub fn validate(&self, source: &str) -> ValidationResult {
        match self.check(source) {
            Ok(normalized) => ValidationResult::valid(normalized),
            Err(diagnostic) => {
                debug!(
                    code = %diagnostic.code,
                    position = diagnostic.position,
                    message = %diagnostic.message,
                    "expression rejected"
                );
                ValidationResult::invalid(diagnostic)
            }
        }
    }

    fn check(&self, source: &str) -> Result<String, Diagnostic> {
        self.compile(source)?;
        Ok(normalize(source))
    }

    /// Runs every check and returns the parsed tree. Stored rules go through
    /// here too, so an expression that never passed validation is still
    /// bounded in length before the parser builds a tree from it.
    pub fn compile(&self, source: &str) -> Result<Expr, Diagnostic> {
        let trimmed = source.trim();
        let length = trimmed.chars().count();

        if length < self.limits.min_length {
            return Err(Diagnostic::at(
                DiagnosticCode::ParseError,
                "Expression too short",
                source,
                0,
            ));
        }

        if length > self.limits.max_length {
            let leading = source.chars().take_while(|c| c.is_whitespace()).count();
            return Err(Diagnostic::at(
                DiagnosticCode::ParseError,
                format!(
                    "Expression too long (at most {} characters)",
                    self.limits.max_length
                ),
                source,
                leading + self.limits.max_length,
            ));
        }

        let tokens = tokenize(source);
        detect_unsupported(&tokens, source)?;

        let expr = Parser::new(tokens, source).parse()?;
        self.check_expr(&expr, source)?;
        Ok(expr)
    }

    /// Checks every comparison of an already parsed expression against the
    /// catalog: field on the left, known field, literal on the right, and an
    /// operator the field's kind allows.
    pub fn check_expr(&self, expr: &Expr, source: &str) -> Result<(), Diagnostic> {
        for comparison in expr.comparisons() {
            let Expr::Compare {
                op,
                left,
                right,
                position,
            } = comparison
            else {
                continue;
            };

            let Some(name) = left.field_name() else {
                return Err(Diagnostic::at(
                    DiagnosticCode::InvalidField,
                    "Left side of a comparison must be a field",
                    source,
                    left.position(),
                ));
            };

            let Some(def) = self.catalog.get(name) else {
                return Err(Diagnostic::at(
                    DiagnosticCode::InvalidField,
                    format!("Unknown field: {}", name),
                    source,
                    left.position(),
                ));
            };

            if let Operand::Field {
                name: other,
                position: other_position,
            } = right
            {
                return Err(Diagnostic::at(
                    DiagnosticCode::InvalidField,
                    format!(
                        "Right side of a comparison must be a literal, got field '{}'",
                        other
                    ),
                    source,
                    *other_position,
                ));
            }

            if def.kind == FieldKind::Text && op.is_ordering() {
                return Err(Diagnostic::at(
                    DiagnosticCode::InvalidOperator,
                    format!("Operator '{}' is not allowed for text field '{}'", op, name),
                    source,
                    *position,
                ));
            }
        }
        Ok(())
    }
}

/// Reports constructs outside this language tier before the grammar gets a
/// chance to call them plain syntax errors.
fn detect_unsupported(tokens: &[Token], source: &str) -> Result<(), Diagnostic> {
    for (i, token) in tokens.iter().enumerate() {
        if token.is(TokenKind::Unknown) && ARITHMETIC.contains(&token.text.as_str()) {
            return Err(Diagnostic::at(
                DiagnosticCode::UnsupportedTier,
                format!("Arithmetic and signed numbers are not supported ('{}')", token.text),
                source,
                token.position,
            ));
        }

        if token.is(TokenKind::Ident)
            && tokens
                .get(i + 1)
                .is_some_and(|next| next.is(TokenKind::LParen))
        {
            return Err(Diagnostic::at(
                DiagnosticCode::UnsupportedTier,
                format!("Function calls are not supported ('{}')", token.text),
                source,
                token.position,
            ));
        }
    }
    Ok(())
}
