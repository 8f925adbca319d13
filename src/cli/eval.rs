//! Evaluate expressions and score transactions against JSON input

use std::sync::Arc;

use serde::Serialize;

use super::CliError;
use crate::{Decision, EvalContext, Rule, RuleBook, RuleEngine};

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The REL expression to evaluate
    pub expression: String,
    /// Transaction JSON
    pub transaction: Option<String>,
    /// User JSON; an empty user when absent
    pub user: Option<String>,
}

/// Result of the eval command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvalOutcome {
    /// Canonical form of the evaluated expression
    pub expression: String,
    pub matched: bool,
}

/// Options for the score command
#[derive(Debug, Clone, Default)]
pub struct ScoreOptions {
    /// JSON array of rules
    pub rules: String,
    pub transaction: Option<String>,
    pub user: Option<String>,
}

fn context(transaction: Option<&String>, user: Option<&String>) -> Result<EvalContext, CliError> {
    let transaction: serde_json::Value =
        serde_json::from_str(transaction.ok_or(CliError::NoInput)?)?;
    let user: serde_json::Value = match user {
        Some(json) => serde_json::from_str(json)?,
        None => serde_json::Value::Object(Default::default()),
    };
    Ok(EvalContext::from_json(transaction, user))
}

/// Validates the expression first, so authoring mistakes are reported instead
/// of silently evaluating to false.
pub fn execute_eval(engine: &RuleEngine, options: &EvalOptions) -> Result<EvalOutcome, CliError> {
    let expr = engine
        .validator()
        .compile(&options.expression)
        .map_err(CliError::Invalid)?;
    let ctx = context(options.transaction.as_ref(), options.user.as_ref())?;

    Ok(EvalOutcome {
        expression: expr.to_string(),
        matched: engine.evaluate(&expr, &ctx),
    })
}

pub fn execute_score(engine: &RuleEngine, options: &ScoreOptions) -> Result<Decision, CliError> {
    let rules: Vec<Rule> = serde_json::from_str(&options.rules)?;
    let book = RuleBook::with_rules(Arc::new(engine.catalog().clone()), rules)
        .with_limits(engine.validator().limits());
    let ctx = context(options.transaction.as_ref(), options.user.as_ref())?;
    Ok(engine.score(&book, &ctx))
}
