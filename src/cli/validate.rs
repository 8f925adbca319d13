//! Validate expressions and inspect their tokens

use serde::Serialize;

use crate::{RuleEngine, ValidationResult, tokenize};

/// Serializable view of a token for `rel tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenView {
    pub kind: &'static str,
    pub text: String,
    pub position: usize,
}

pub fn execute_validate(engine: &RuleEngine, expression: &str) -> ValidationResult {
    engine.validate(expression)
}

pub fn execute_tokens(expression: &str) -> Vec<TokenView> {
    tokenize(expression)
        .into_iter()
        .map(|t| TokenView {
            kind: t.kind.name(),
            text: t.text,
            position: t.position,
        })
        .collect()
}
