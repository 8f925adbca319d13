use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    ast::Expr,
    catalog::FieldCatalog,
    context::EvalContext,
    evaluator::Evaluator,
    scoring::{CompiledRule, Decision, Rule, RuleResult, RuleSource},
    validator::{ValidationLimits, ValidationResult, Validator},
};

/// One catalog, one validator and one evaluator: everything needed to author
/// and score rules. Stateless between calls.
pub struct RuleEngine {
    validator: Validator,
    evaluator: Evaluator,
}

impl RuleEngine {
    pub fn new(catalog: Arc<FieldCatalog>) -> Self {
        RuleEngine {
            validator: Validator::new(Arc::clone(&catalog)),
            evaluator: Evaluator::new(catalog),
        }
    }

    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.validator = self.validator.with_limits(limits);
        self.evaluator = self
            .evaluator
            .with_max_length(self.validator.limits().max_length);
        self
    }

    pub fn catalog(&self) -> &FieldCatalog {
        self.validator.catalog()
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn validate(&self, source: &str) -> ValidationResult {
        self.validator.validate(source)
    }

    pub fn compile(&self, rule: Rule) -> CompiledRule {
        CompiledRule::compile(rule, &self.validator)
    }

    pub fn evaluate(&self, expr: &Expr, ctx: &EvalContext) -> bool {
        self.evaluator.evaluate(expr, ctx)
    }

    /// Result record for a single rule. A rule that did not compile never matches.
    pub fn evaluate_rule(&self, rule: &CompiledRule, ctx: &EvalContext) -> RuleResult {
        let matched = match &rule.compiled {
            Ok(expr) => self.evaluator.evaluate(expr, ctx),
            Err(_) => false,
        };

        debug!(rule_id = %rule.rule.id, priority = rule.rule.priority, matched, "rule evaluated");

        RuleResult {
            rule_id: rule.rule.id.clone(),
            rule_name: rule.rule.name.clone(),
            priority: rule.rule.priority,
            enabled: rule.rule.enabled,
            matched,
            description: rule.describe(),
        }
    }

    /// Scores a transaction against `rules` in the order given.
    pub fn score_rules(&self, rules: &[CompiledRule], ctx: &EvalContext) -> Decision {
        let results = rules.iter().map(|r| self.evaluate_rule(r, ctx)).collect();
        let decision = Decision::from_results(results);
        info!(
            rules = decision.rule_results.len(),
            matched = decision.matched().count(),
            fraud = decision.is_fraud,
            "transaction scored"
        );
        decision
    }

    /// Scores a transaction against the enabled rules of `source`.
    pub fn score(&self, source: &dyn RuleSource, ctx: &EvalContext) -> Decision {
        let rules = source.enabled_rules();
        self.score_rules(&rules, ctx)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        RuleEngine::new(Arc::new(FieldCatalog::standard()))
    }
}
