//! Per-transaction scoring: every enabled rule is evaluated in
//! `(priority, id)` order and produces one explainable result. A transaction
//! is fraudulent when at least one rule matched.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    ast::Expr,
    catalog::FieldCatalog,
    diagnostic::Diagnostic,
    validator::{ValidationLimits, Validator},
};

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i32 {
    100
}

/// A stored fraud rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub dsl_expression: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

/// A rule with its expression parsed and checked once, ready to be evaluated
/// any number of times.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: Rule,
    pub compiled: Result<Arc<Expr>, Diagnostic>,
}

impl CompiledRule {
    pub fn compile(rule: Rule, validator: &Validator) -> Self {
        let compiled = validator.compile(&rule.dsl_expression).map(Arc::new);

        if let Err(diagnostic) = &compiled {
            warn!(
                rule_id = %rule.id,
                code = %diagnostic.code,
                message = %diagnostic.message,
                "stored rule does not compile and will never match"
            );
        }

        CompiledRule { rule, compiled }
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_ok()
    }

    /// Human-readable explanation for the rule's result, always naming its expression.
    pub fn describe(&self) -> String {
        match &self.compiled {
            Ok(expr) => format!("Evaluated: {}", expr),
            Err(diagnostic) => format!(
                "Not evaluated: {} ({}: {})",
                self.rule.dsl_expression, diagnostic.code, diagnostic.message
            ),
        }
    }
}

/// Sorts by `(priority, id)`, the order rules are evaluated and reported in.
pub fn sort_rules(rules: &mut [CompiledRule]) {
    rules.sort_by(|a, b| {
        (a.rule.priority, &a.rule.id).cmp(&(b.rule.priority, &b.rule.id))
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    pub rule_id: String,
    pub rule_name: String,
    pub priority: i32,
    pub enabled: bool,
    pub matched: bool,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Approved,
    Declined,
}

/// Outcome of scoring one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub is_fraud: bool,
    pub status: TransactionStatus,
    pub rule_results: Vec<RuleResult>,
}

impl Decision {
    /// OR over all rule results: one match declines the transaction.
    pub fn from_results(rule_results: Vec<RuleResult>) -> Self {
        let is_fraud = rule_results.iter().any(|r| r.matched);
        Decision {
            is_fraud,
            status: if is_fraud {
                TransactionStatus::Declined
            } else {
                TransactionStatus::Approved
            },
            rule_results,
        }
    }

    pub fn matched(&self) -> impl Iterator<Item = &RuleResult> {
        self.rule_results.iter().filter(|r| r.matched)
    }
}

/// Supplier of the currently enabled rules.
///
/// Implementations may cache; a cached list may be stale until `invalidate`
/// is called. Calling `invalidate` more than once is harmless.
pub trait RuleSource {
    /// Enabled rules, ordered by `(priority, id)`.
    fn enabled_rules(&self) -> Arc<Vec<CompiledRule>>;

    /// Drops any cached list so the next read sees current rules.
    fn invalidate(&self);
}

/// In-memory rule store that keeps a compiled snapshot of its enabled rules.
///
/// Every mutation drops the snapshot before returning, so a reader never
/// sees a list older than the last completed mutation.
pub struct RuleBook {
    validator: Validator,
    rules: RwLock<BTreeMap<String, Rule>>,
    snapshot: RwLock<Option<Arc<Vec<CompiledRule>>>>,
}

impl RuleBook {
    pub fn new(catalog: Arc<FieldCatalog>) -> Self {
        RuleBook {
            validator: Validator::new(catalog),
            rules: RwLock::new(BTreeMap::new()),
            snapshot: RwLock::new(None),
        }
    }

    /// Limits applied when stored rules are compiled.
    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.validator = self.validator.with_limits(limits);
        self.invalidate();
        self
    }

    pub fn with_rules(catalog: Arc<FieldCatalog>, rules: impl IntoIterator<Item = Rule>) -> Self {
        let book = RuleBook::new(catalog);
        {
            let mut stored = book.rules.write().unwrap_or_else(PoisonError::into_inner);
            for rule in rules {
                stored.insert(rule.id.clone(), rule);
            }
        }
        book
    }

    /// Inserts or replaces a rule by id.
    pub fn upsert(&self, rule: Rule) {
        debug!(rule_id = %rule.id, "rule upserted");
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(rule.id.clone(), rule);
        self.invalidate();
    }

    /// Disables a rule; returns false when no rule has that id.
    pub fn disable(&self, id: &str) -> bool {
        let found = match self
            .rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(id)
        {
            Some(rule) => {
                rule.enabled = false;
                true
            }
            None => false,
        };
        self.invalidate();
        found
    }

    pub fn remove(&self, id: &str) -> Option<Rule> {
        let removed = self
            .rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        self.invalidate();
        removed
    }

    pub fn get(&self, id: &str) -> Option<Rule> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RuleSource for RuleBook {
    fn enabled_rules(&self) -> Arc<Vec<CompiledRule>> {
        if let Some(snapshot) = self
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(snapshot);
        }

        // Holding the rules lock while publishing keeps a mutation from
        // slipping between the build and the store.
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        let mut compiled: Vec<CompiledRule> = rules
            .values()
            .filter(|r| r.enabled)
            .map(|r| CompiledRule::compile(r.clone(), &self.validator))
            .collect();
        sort_rules(&mut compiled);

        let compiled = Arc::new(compiled);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&compiled));
        debug!(
            rules = compiled.len(),
            uncompiled = compiled.iter().filter(|r| !r.is_compiled()).count(),
            "enabled rule snapshot rebuilt"
        );
        compiled
    }

    fn invalidate(&self) {
        self.snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
