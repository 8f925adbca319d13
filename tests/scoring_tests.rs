// tests/scoring_tests.rs

use std::sync::Arc;

use fraud_rel::{
    Decision, EvalContext, FieldCatalog, Rule, RuleBook, RuleEngine, RuleSource,
    TransactionStatus, ValidationLimits,
};
use serde_json::json;

fn rule(id: &str, expression: &str, priority: i32) -> Rule {
    Rule {
        id: id.to_string(),
        name: format!("rule {}", id),
        description: None,
        dsl_expression: expression.to_string(),
        enabled: true,
        priority,
    }
}

fn book(rules: Vec<Rule>) -> RuleBook {
    RuleBook::with_rules(Arc::new(FieldCatalog::standard()), rules)
}

fn ctx(amount: i64) -> EvalContext {
    EvalContext::from_json(
        json!({"amount": amount, "currency": "RUB", "channel": "WEB"}),
        json!({"age": 19}),
    )
}

fn ids(decision: &Decision) -> Vec<&str> {
    decision
        .rule_results
        .iter()
        .map(|r| r.rule_id.as_str())
        .collect()
}

// ============================================================================
// Decisions
// ============================================================================

#[test]
fn test_single_rule_decline_and_approve() {
    let engine = RuleEngine::default();
    let rules = book(vec![rule("big", "amount > 10000", 100)]);

    let declined = engine.score(&rules, &ctx(15000));
    assert!(declined.is_fraud);
    assert_eq!(declined.status, TransactionStatus::Declined);
    assert!(declined.rule_results[0].matched);
    assert_eq!(declined.rule_results[0].description, "Evaluated: amount > 10000");

    let approved = engine.score(&rules, &ctx(5000));
    assert!(!approved.is_fraud);
    assert_eq!(approved.status, TransactionStatus::Approved);
    assert!(!approved.rule_results[0].matched);
}

#[test]
fn test_any_match_declines() {
    let engine = RuleEngine::default();
    let rules = book(vec![
        rule("a", "amount > 100000", 1),
        rule("b", "user.age < 21", 2),
        rule("c", "currency = 'USD'", 3),
    ]);

    let decision = engine.score(&rules, &ctx(500));
    assert!(decision.is_fraud);
    let matched: Vec<&str> = decision.matched().map(|r| r.rule_id.as_str()).collect();
    assert_eq!(matched, vec!["b"]);
    assert_eq!(decision.rule_results.len(), 3);
}

#[test]
fn test_no_rules_approves() {
    let decision = RuleEngine::default().score(&book(vec![]), &ctx(1_000_000));
    assert!(!decision.is_fraud);
    assert_eq!(decision.status, TransactionStatus::Approved);
    assert!(decision.rule_results.is_empty());
}

#[test]
fn test_results_ordered_by_priority_then_id() {
    let engine = RuleEngine::default();
    let rules = book(vec![
        rule("zeta", "amount > 1", 10),
        rule("beta", "amount > 1", 20),
        rule("alpha", "amount > 1", 20),
        rule("omega", "amount > 1", 5),
    ]);

    let decision = engine.score(&rules, &ctx(10));
    assert_eq!(ids(&decision), vec!["omega", "zeta", "alpha", "beta"]);
    let priorities: Vec<i32> = decision.rule_results.iter().map(|r| r.priority).collect();
    assert_eq!(priorities, vec![5, 10, 20, 20]);
}

#[test]
fn test_disabled_rules_are_skipped() {
    let engine = RuleEngine::default();
    let mut off = rule("off", "amount > 1", 1);
    off.enabled = false;
    let rules = book(vec![off, rule("on", "amount > 1000000", 2)]);

    let decision = engine.score(&rules, &ctx(10));
    assert_eq!(ids(&decision), vec!["on"]);
    assert!(decision.rule_results.iter().all(|r| r.enabled));
    assert!(!decision.is_fraud);
}

#[test]
fn test_broken_rule_never_matches() {
    let engine = RuleEngine::default();
    let rules = book(vec![
        rule("broken", "amount >", 1),
        rule("stale", "riskScore > 1", 2),
        rule("ok", "channel = 'WEB'", 3),
    ]);

    let decision = engine.score(&rules, &ctx(10));
    assert_eq!(ids(&decision), vec!["broken", "stale", "ok"]);

    let broken = &decision.rule_results[0];
    assert!(!broken.matched);
    assert!(broken.description.starts_with("Not evaluated: amount > (DSL_PARSE_ERROR:"));

    let stale = &decision.rule_results[1];
    assert!(!stale.matched);
    assert!(stale.description.contains("DSL_INVALID_FIELD"));

    assert!(decision.rule_results[2].matched);
    assert!(decision.is_fraud);
}

#[test]
fn test_over_long_stored_rule_is_not_evaluated() {
    let engine = RuleEngine::default();
    let chain = format!("{}amount > 1", "amount > 1 AND ".repeat(200_000));
    let rules = book(vec![rule("huge", &chain, 1), rule("ok", "amount > 1", 2)]);

    let compiled = rules.enabled_rules();
    assert!(!compiled[0].is_compiled());
    assert!(compiled[1].is_compiled());

    let decision = engine.score(&rules, &ctx(10));
    let huge = &decision.rule_results[0];
    assert!(!huge.matched);
    assert!(huge.description.starts_with("Not evaluated: "));
    assert!(huge.description.contains("(DSL_PARSE_ERROR: Expression too long"));
    assert!(decision.rule_results[1].matched);
    assert!(decision.is_fraud);
}

#[test]
fn test_stored_rules_follow_book_limits() {
    let engine = RuleEngine::default();
    let rules = book(vec![rule("r", "amount > 10000", 1)]).with_limits(ValidationLimits {
        min_length: 3,
        max_length: 10,
    });

    let decision = engine.score(&rules, &ctx(20000));
    assert!(!decision.is_fraud);
    assert!(decision.rule_results[0].description.contains("Expression too long"));
}

#[test]
fn test_out_of_tier_stored_rule_reports_unsupported_tier() {
    let engine = RuleEngine::default();
    let rules = book(vec![
        rule("call", "abs(amount) > 1", 1),
        rule("math", "amount * 2 > 1", 2),
    ]);

    let decision = engine.score(&rules, &ctx(10));
    for result in &decision.rule_results {
        assert!(!result.matched);
        assert!(
            result.description.contains("DSL_UNSUPPORTED_TIER"),
            "unexpected description: {}",
            result.description
        );
    }
}

#[test]
fn test_compile_agrees_with_validate() {
    let engine = RuleEngine::default();
    for source in ["abs(amount) > 1", "amount >", "currency > 'A'", "unknown = 1", "ab"] {
        let compiled = engine.compile(rule("r", source, 1));
        let validated = engine.validate(source);
        assert_eq!(
            compiled.compiled.as_ref().err(),
            validated.error(),
            "Failed for {}",
            source
        );
    }
}

#[test]
fn test_description_uses_canonical_text() {
    let engine = RuleEngine::default();
    let rules = book(vec![rule("r", "amount>1   and not  currency='USD'", 1)]);
    let decision = engine.score(&rules, &ctx(10));
    assert_eq!(
        decision.rule_results[0].description,
        "Evaluated: amount > 1 AND NOT currency = 'USD'"
    );
}

#[test]
fn test_decision_serialization() {
    let engine = RuleEngine::default();
    let rules = book(vec![rule("r1", "amount > 10", 7)]);
    let decision = engine.score(&rules, &ctx(11));

    assert_eq!(
        serde_json::to_value(&decision).unwrap(),
        json!({
            "isFraud": true,
            "status": "DECLINED",
            "ruleResults": [{
                "ruleId": "r1",
                "ruleName": "rule r1",
                "priority": 7,
                "enabled": true,
                "matched": true,
                "description": "Evaluated: amount > 10"
            }]
        })
    );
}

#[test]
fn test_rule_defaults_from_json() {
    let rule: Rule = serde_json::from_value(json!({
        "id": "r",
        "name": "Large amount",
        "dslExpression": "amount > 10000"
    }))
    .unwrap();
    assert!(rule.enabled);
    assert_eq!(rule.priority, 100);
    assert_eq!(rule.description, None);
}

// ============================================================================
// Rule Book Snapshot
// ============================================================================

#[test]
fn test_snapshot_is_reused_until_mutation() {
    let rules = book(vec![rule("a", "amount > 1", 1)]);
    let first = rules.enabled_rules();
    let second = rules.enabled_rules();
    assert!(Arc::ptr_eq(&first, &second));

    rules.upsert(rule("b", "amount > 2", 2));
    let third = rules.enabled_rules();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.len(), 2);
}

#[test]
fn test_mutations_are_visible_immediately() {
    let engine = RuleEngine::default();
    let rules = book(vec![rule("a", "amount > 100", 1)]);
    assert!(engine.score(&rules, &ctx(500)).is_fraud);

    assert!(rules.disable("a"));
    assert!(!engine.score(&rules, &ctx(500)).is_fraud);

    rules.upsert(rule("a", "amount > 1000", 1));
    let decision = engine.score(&rules, &ctx(500));
    assert_eq!(decision.rule_results.len(), 1);
    assert!(!decision.is_fraud);

    assert!(rules.remove("a").is_some());
    assert!(engine.score(&rules, &ctx(500)).rule_results.is_empty());
    assert!(rules.is_empty());
}

#[test]
fn test_disable_unknown_rule() {
    let rules = book(vec![]);
    assert!(!rules.disable("missing"));
    assert_eq!(rules.get("missing"), None);
}

#[test]
fn test_redundant_invalidation_is_harmless() {
    let rules = book(vec![rule("a", "amount > 1", 1)]);
    rules.invalidate();
    rules.invalidate();
    assert_eq!(rules.enabled_rules().len(), 1);
    rules.invalidate();
    assert_eq!(rules.enabled_rules().len(), 1);
}

#[test]
fn test_concurrent_scoring_and_mutation() {
    let engine = Arc::new(RuleEngine::default());
    let rules = Arc::new(book(vec![rule("a", "amount > 1", 1)]));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let rules = Arc::clone(&rules);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let decision = engine.score(rules.as_ref(), &ctx(10));
                    assert!(!decision.rule_results.is_empty());
                }
            })
        })
        .collect();

    for i in 0..50 {
        rules.upsert(rule(&format!("extra{}", i), "amount > 1000", 50));
    }

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(rules.enabled_rules().len(), 51);
}
