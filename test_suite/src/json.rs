use regex::Regex;
use serde_json::{json, Value};

use condition_query::json;
use condition_query::*;

fn registry() -> FieldRegistry<Value> {
    FieldRegistry::new()
        .with(
            "code",
            TypedField::new(json::field::<String>("code"), ComparatorSet::textual())
                .pattern(Regex::new(r"^\d+$").unwrap()),
        )
        .with(
            "price",
            TypedField::new(json::field::<f64>("price"), ComparatorSet::ordered()).min(0.0),
        )
        .with(
            "shares",
            TypedField::new(json::field::<i64>("shares"), ComparatorSet::ordered()),
        )
        .with("pbr", IgnoredField::new())
}

fn rows() -> Vec<Value> {
    vec![
        json!({"code": "100", "price": 100, "shares": 10}),
        json!({"code": "600", "price": 250.5}),
        json!({"code": "200", "price": 300, "shares": 5}),
    ]
}

fn select(text: &str) -> Result<Vec<Value>, ConditionError> {
    let predicate = compile(text, &registry(), &ConditionConfig::default())?;
    let mut rows = rows();
    predicate.filter_vec(&mut rows);
    Ok(rows)
}

#[test_log::test]
fn filters_json_rows() {
    let selected = select("price < 500 and code == \"600\"").unwrap();
    assert_eq!(selected, vec![json!({"code": "600", "price": 250.5})]);
}

#[test_log::test]
fn missing_keys_do_not_match() {
    let selected = select("shares >= 5").unwrap();
    let codes: Vec<&str> = selected.iter().filter_map(|r| r["code"].as_str()).collect();
    assert_eq!(codes, vec!["100", "200"]);
}

#[test_log::test]
fn values_are_checked() {
    let err = select("code == 'abc'").unwrap_err();
    assert_eq!(
        err.to_string(),
        r"Invalid data (code, abc): value does not match ^\d+$"
    );
    let err = select("price >= -1").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid data (price, -1): ensure this value is greater than or equal to 0"
    );
    let err = select("shares < 1.5").unwrap_err();
    assert!(matches!(err, ConditionError::InvalidValue { .. }));
}

#[test_log::test]
fn ignored_without_a_column_cannot_build() {
    let registry = registry();
    let config = ConditionConfig::default();
    assert!(validate_condition("pbr < 1", &registry, &config).is_ok());
    let err = compile("pbr < 1", &registry, &config).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot filter pbr by 1: field has no backing column"
    );
}
