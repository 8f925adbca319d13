// tests/evaluator_tests.rs

use std::sync::Arc;

use fraud_rel::{
    EvalContext, Evaluator, FieldCatalog, FieldDef, FieldKind, TransactionRecord, UserRecord,
    parse,
};
use serde_json::{Value as JsonValue, json};

fn evaluator() -> Evaluator {
    Evaluator::new(Arc::new(FieldCatalog::standard()))
}

fn eval(source: &str, tx: JsonValue, user: JsonValue) -> bool {
    let expr = parse(source).unwrap();
    evaluator().evaluate(&expr, &EvalContext::from_json(tx, user))
}

fn eval_tx(source: &str, tx: JsonValue) -> bool {
    eval(source, tx, json!({}))
}

// ============================================================================
// Numeric Comparisons
// ============================================================================

#[test]
fn test_amount_threshold() {
    assert!(eval_tx("amount > 10000", json!({"amount": 15000, "currency": "RUB"})));
    assert!(!eval_tx("amount > 10000", json!({"amount": 5000, "currency": "RUB"})));
}

#[test]
fn test_numeric_operators() {
    let tx = json!({"amount": 100});
    let cases = [
        ("amount = 100", true),
        ("amount != 100", false),
        ("amount < 100", false),
        ("amount <= 100", true),
        ("amount > 99.5", true),
        ("amount >= 100.5", false),
    ];
    for (source, expected) in cases {
        assert_eq!(eval_tx(source, tx.clone()), expected, "Failed for {}", source);
    }
}

#[test]
fn test_numeric_equality_is_exact() {
    assert!(eval_tx("amount = 0.3", json!({"amount": 0.3})));
    assert!(!eval_tx("amount = 0.3", json!({"amount": 0.30000000000000004})));
}

#[test]
fn test_numeric_strings_and_booleans_are_cast() {
    assert!(eval_tx("amount > 10", json!({"amount": " 15.5 "})));
    assert!(eval_tx("amount = 1", json!({"amount": true})));
    assert!(!eval_tx("amount > 10", json!({"amount": "lots"})));
}

#[test]
fn test_nested_numeric_field() {
    let tx = json!({"location": {"country": "RU", "latitude": 55.75}});
    assert!(eval_tx("location.latitude > 55", tx.clone()));
    assert!(!eval_tx("location.longitude > 0", tx));
}

// ============================================================================
// Text Comparisons
// ============================================================================

#[test]
fn test_text_equality() {
    let tx = json!({"currency": "RUB", "location": {"country": "RU"}});
    assert!(eval_tx("currency = 'RUB'", tx.clone()));
    assert!(!eval_tx("currency = 'rub'", tx.clone()));
    assert!(eval_tx("location.country != 'US'", tx));
}

#[test]
fn test_numbers_compare_as_text() {
    assert!(eval_tx("merchantCategoryCode = '5411'", json!({"merchantCategoryCode": 5411})));
}

#[test]
fn test_text_ordering_never_matches() {
    let tx = json!({"currency": "RUB"});
    assert!(!eval_tx("currency > 'AAA'", tx.clone()));
    assert!(!eval_tx("currency <= 'ZZZ'", tx));
}

// ============================================================================
// Fail-safe Resolution
// ============================================================================

#[test]
fn test_missing_field_is_a_non_match() {
    assert!(!eval_tx("merchantId = 'X'", json!({"amount": 1})));
    assert!(!eval_tx("merchantId != 'X'", json!({"amount": 1})));
}

#[test]
fn test_null_counts_as_missing() {
    assert!(!eval("user.age < 21", json!({}), json!({"age": null})));
}

#[test]
fn test_nesting_into_a_scalar_is_missing() {
    assert!(!eval_tx("location.country = 'RU'", json!({"location": "RU"})));
}

#[test]
fn test_not_of_failed_comparison_matches() {
    assert!(eval_tx("NOT merchantId = 'X'", json!({})));
}

#[test]
fn test_non_scalar_values_never_match() {
    let tx = json!({"amount": [1, 2], "currency": {"code": "RUB"}});
    assert!(!eval_tx("amount > 0", tx.clone()));
    assert!(!eval_tx("currency = 'RUB'", tx));
}

#[test]
fn test_invalid_shapes_never_match() {
    let tx = json!({"amount": 5, "currency": "5"});
    assert!(!eval_tx("5 = amount", tx.clone()));
    assert!(!eval_tx("amount = currency", tx.clone()));
    assert!(!eval_tx("5 = 5", tx));
}

#[test]
fn test_fields_outside_the_catalog_never_match() {
    assert!(!eval_tx("riskScore > 1", json!({"riskScore": 99})));

    let custom = Evaluator::new(Arc::new(
        FieldCatalog::new([FieldDef::new("riskScore", FieldKind::Numeric)]).unwrap(),
    ));
    let ctx = EvalContext::from_json(json!({"riskScore": 99, "amount": 1}), json!({}));
    assert!(custom.evaluate(&parse("riskScore > 1").unwrap(), &ctx));
    assert!(!custom.evaluate(&parse("amount > 0").unwrap(), &ctx));
}

#[test]
fn test_unparsable_source_never_matches() {
    let ctx = EvalContext::from_json(json!({"amount": 1}), json!({}));
    assert!(!evaluator().evaluate_source("amount >", &ctx));
    assert!(!evaluator().evaluate_source("", &ctx));
    assert!(evaluator().evaluate_source("amount >= 1", &ctx));
}

#[test]
fn test_over_long_source_never_matches() {
    let ctx = EvalContext::from_json(json!({"amount": 5}), json!({}));
    let chain = format!("{}amount > 1", "amount > 1 AND ".repeat(200_000));
    assert!(!evaluator().evaluate_source(&chain, &ctx));

    let short = evaluator().with_max_length(10);
    assert!(short.evaluate_source("amount > 1", &ctx));
    assert!(!short.evaluate_source("amount > 1 AND amount > 2", &ctx));
}

// ============================================================================
// Logical Composition
// ============================================================================

#[test]
fn test_not_binds_to_single_comparison() {
    let tx = json!({"amount": 50, "currency": "USD"});
    assert!(eval_tx("NOT amount > 100 AND currency = 'USD'", tx.clone()));
    assert!(!eval_tx("NOT (amount > 10 AND currency = 'USD')", tx));
}

#[test]
fn test_and_or_precedence() {
    let tx = json!({"amount": 1, "currency": "EUR", "channel": "WEB"});
    // amount > 100 OR (currency = 'EUR' AND channel = 'WEB')
    assert!(eval_tx("amount > 100 OR currency = 'EUR' AND channel = 'WEB'", tx.clone()));
    assert!(!eval_tx("(amount > 100 OR currency = 'EUR') AND channel = 'POS'", tx));
}

#[test]
fn test_user_fields() {
    let tx = json!({"amount": 20000});
    let user = json!({"age": 19, "region": "EU"});
    assert!(eval("amount > 10000 AND user.age < 21", tx.clone(), user.clone()));
    assert!(eval("user.region = 'EU'", tx.clone(), user.clone()));
    assert!(!eval("user.age >= 21 OR user.region = 'US'", tx, user));
}

#[test]
fn test_typed_records() {
    let tx: TransactionRecord = serde_json::from_value(json!({
        "amount": "12500.75",
        "currency": "RUB",
        "merchantId": "m-1",
        "channel": "MOBILE",
        "location": {"country": "RU", "city": "Kazan"}
    }))
    .unwrap();
    let user = UserRecord {
        age: Some(30),
        region: None,
    };
    let ctx = EvalContext::from_records(&tx, &user);

    let expr = parse(
        "amount > 12500 AND channel = 'MOBILE' AND location.city = 'Kazan' AND user.age >= 18",
    )
    .unwrap();
    assert!(evaluator().evaluate(&expr, &ctx));
    assert!(!evaluator().evaluate(&parse("user.region = 'EU'").unwrap(), &ctx));
    assert!(evaluator().evaluate(&parse("NOT user.region = 'EU'").unwrap(), &ctx));
}

#[test]
fn test_shared_across_threads() {
    let evaluator = evaluator();
    let expr = Arc::new(parse("amount > 100").unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let evaluator = evaluator.clone();
            let expr = Arc::clone(&expr);
            std::thread::spawn(move || {
                let ctx = EvalContext::from_json(json!({"amount": i * 50}), json!({}));
                evaluator.evaluate(&expr, &ctx)
            })
        })
        .collect();

    let matched: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(matched, vec![false, false, false, true, true, true, true, true]);
}
