use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ast::{CompareOp, Expr, Literal, Operand},
    catalog::FieldCatalog,
    context::EvalContext,
    parser::parse,
    validator::ValidationLimits,
};

/// Why a comparison could not be carried out.
///
/// These never leave the evaluator: each one turns the enclosing comparison
/// into a non-match and is only reported through tracing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("field '{0}' is not in the catalog")]
    UnknownField(String),

    #[error("field '{0}' has no value")]
    Absent(String),

    #[error("value of '{field}' ({found}) cannot be read as {expected}")]
    Cast {
        field: String,
        found: &'static str,
        expected: &'static str,
    },

    #[error("operator '{0}' cannot compare text")]
    TextOrdering(CompareOp),

    #[error("comparison must be a field against a literal")]
    Shape,
}

/// Evaluates parsed expressions against an [`EvalContext`].
///
/// Evaluation is total: any comparison that cannot be resolved is a
/// non-match, so one stale rule cannot break scoring of a transaction.
/// The evaluator holds no mutable state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Evaluator {
    catalog: Arc<FieldCatalog>,
    max_length: usize,
}

impl Evaluator {
    pub fn new(catalog: Arc<FieldCatalog>) -> Self {
        Evaluator {
            catalog,
            max_length: ValidationLimits::default().max_length,
        }
    }

    /// Longest source text [`Evaluator::evaluate_source`] will parse.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Returns whether `expr` holds for `ctx`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use fraud_rel::{EvalContext, Evaluator, FieldCatalog, parse};
    /// use serde_json::json;
    ///
    /// let evaluator = Evaluator::new(Arc::new(FieldCatalog::standard()));
    /// let expr = parse("amount > 10000").unwrap();
    ///
    /// let ctx = EvalContext::from_json(json!({"amount": 15000, "currency": "RUB"}), json!({}));
    /// assert!(evaluator.evaluate(&expr, &ctx));
    /// ```
    pub fn evaluate(&self, expr: &Expr, ctx: &EvalContext) -> bool {
        match expr {
            Expr::Or { left, right, .. } => self.evaluate(left, ctx) || self.evaluate(right, ctx),
            Expr::And { left, right, .. } => self.evaluate(left, ctx) && self.evaluate(right, ctx),
            Expr::Not { expr, .. } => !self.evaluate(expr, ctx),
            Expr::Compare {
                op,
                left,
                right,
                position,
            } => match self.compare(*op, left, right, ctx) {
                Ok(matched) => {
                    trace!(position, matched, "comparison evaluated");
                    matched
                }
                Err(reason) => {
                    debug!(position, %reason, "comparison resolved to non-match");
                    false
                }
            },
        }
    }

    /// Parses and evaluates in one step; text that does not parse, or is
    /// longer than the configured maximum, never matches.
    pub fn evaluate_source(&self, source: &str, ctx: &EvalContext) -> bool {
        let length = source.trim().chars().count();
        if length > self.max_length {
            debug!(length, max = self.max_length, "expression too long, treating as non-match");
            return false;
        }

        match parse(source) {
            Ok(expr) => self.evaluate(&expr, ctx),
            Err(e) => {
                debug!(error = %e, "expression does not parse, treating as non-match");
                false
            }
        }
    }

    fn compare(
        &self,
        op: CompareOp,
        left: &Operand,
        right: &Operand,
        ctx: &EvalContext,
    ) -> Result<bool, EvalError> {
        let (Operand::Field { name, .. }, Operand::Literal { value: literal, .. }) = (left, right)
        else {
            return Err(EvalError::Shape);
        };

        if !self.catalog.contains(name) {
            return Err(EvalError::UnknownField(name.clone()));
        }

        let value = ctx
            .resolve(name)
            .ok_or_else(|| EvalError::Absent(name.clone()))?;

        match literal {
            Literal::Number(expected) => {
                let actual = value.as_number().ok_or_else(|| EvalError::Cast {
                    field: name.clone(),
                    found: value.type_name(),
                    expected: "number",
                })?;
                Ok(op.apply_f64(actual, *expected))
            }
            Literal::Text(expected) => {
                let actual = value.as_text().ok_or_else(|| EvalError::Cast {
                    field: name.clone(),
                    found: value.type_name(),
                    expected: "text",
                })?;
                op.apply_str(&actual, expected)
                    .ok_or(EvalError::TextOrdering(op))
            }
        }
    }
}
