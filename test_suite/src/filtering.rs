use chrono::{DateTime, Utc};

use condition_query::filtering::{FieldValue, Lookup, Operable};
use condition_query::*;

struct Note;

#[derive(Filterable)]
struct Holding {
    #[condition(op(in, not_in))]
    code: String,
    #[condition(op(lt, lte, gt, gte))]
    price: f64,
    #[condition(rename = "qty", op(lt, gt))]
    shares: Option<u32>,
    #[condition(op(in))]
    tags: Vec<String>,
    #[condition(op(lt, gt))]
    bought: DateTime<Utc>,
    #[condition(ignore)]
    per: f64,
    #[condition(exclude)]
    #[allow(dead_code)]
    note: Note,
}

fn holding(code: &str, price: f64, shares: Option<u32>, tags: &[&str], bought: &str) -> Holding {
    Holding {
        code: code.to_string(),
        price,
        shares,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        bought: bought.parse().unwrap(),
        per: price / 100.0,
        note: Note,
    }
}

fn holdings() -> Vec<Holding> {
    vec![
        holding("7203", 2500.0, Some(100), &["auto", "export"], "2024-01-10T09:00:00Z"),
        holding("6758", 12000.0, None, &["electronics"], "2023-06-01T09:00:00Z"),
        holding("8306", 1500.0, Some(20), &[], "2024-05-20T09:00:00Z"),
    ]
}

fn select(text: &str) -> Vec<String> {
    let registry = FieldRegistry::<Holding>::from_filterable();
    let predicate = compile(text, &registry, &ConditionConfig::default()).unwrap();
    let mut rows = holdings();
    predicate.filter_vec(&mut rows);
    rows.into_iter().map(|h| h.code).collect()
}

#[test]
fn derived_fields() {
    let registry = FieldRegistry::<Holding>::from_filterable();
    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec!["bought", "code", "per", "price", "qty", "tags"]
    );
    assert_eq!(
        registry.get("code").unwrap().operators(),
        &ComparatorSet::textual()
    );
    assert_eq!(
        registry.get("price").unwrap().operators(),
        &ComparatorSet::ordered()
    );
    assert_eq!(
        registry.get("qty").unwrap().operators().to_string(),
        "eq, ne, lt, gt"
    );
    assert!(registry.get("shares").is_none());
    assert!(registry.get("note").is_none());
    assert!(registry.get("per").unwrap().is_ignored());
}

#[test]
fn describe() {
    let registry = FieldRegistry::<Holding>::from_filterable();
    let lines = registry.describe();
    assert!(lines.contains(&"qty__lt".to_string()));
    assert!(lines.contains(&"per (ignored)".to_string()));
    assert!(!lines.contains(&"code__lt".to_string()));
    print_fields(&registry);
}

#[test]
fn scalar_fields() {
    assert_eq!(select("price < 2000 or code == '7203'"), vec!["7203", "8306"]);
    assert_eq!(select("code in '72'"), vec!["7203"]);
    assert_eq!(select("code not in '72'"), vec!["6758", "8306"]);
}

#[test]
fn optional_fields_compare_only_present_values() {
    assert_eq!(select("qty > 50"), vec!["7203"]);
    assert_eq!(select("qty < 50"), vec!["8306"]);
    assert_eq!(select("qty == 100"), vec!["7203"]);
}

#[test]
fn not_equal_on_optional_fields_includes_none() {
    // `!=` is the negation of exact, and exact never matches a missing value.
    assert_eq!(select("qty != 100"), vec!["6758", "8306"]);
}

#[test]
fn collection_fields_match_any() {
    assert_eq!(select("tags == 'export'"), vec!["7203"]);
    assert_eq!(select("tags in 'ec'"), vec!["6758"]);
}

#[test]
fn datetime_fields() {
    assert_eq!(
        select("bought > '2024-01-01T00:00:00Z'"),
        vec!["7203", "8306"]
    );
    let registry = FieldRegistry::<Holding>::from_filterable();
    let err = compile("bought > 'yesterday'", &registry, &ConditionConfig::default()).unwrap_err();
    assert!(matches!(err, ConditionError::InvalidValue { .. }));
    assert!(err
        .to_string()
        .starts_with("Invalid data (bought, yesterday): "));
}

#[test]
fn ignored_fields_still_filter() {
    assert_eq!(select("per > 100"), vec!["6758"]);
    // Not checked, so a bad value only shows up when building.
    let registry = FieldRegistry::<Holding>::from_filterable();
    let condition = Condition::parse("per > 'high'", &ConditionConfig::default()).unwrap();
    assert!(condition.validate(&registry).is_ok());
    assert!(matches!(
        condition.compile(&registry),
        Err(ConditionError::Build(BuildError::Filter { .. }))
    ));
}

#[derive(Filterable)]
struct Tagged<T>
where
    T: Operable + 'static,
    <T as Operable>::Base: FieldValue,
{
    label: String,
    #[condition(op(lt, gt))]
    value: T,
}

#[test]
fn generic_records() {
    let registry = FieldRegistry::<Tagged<i64>>::from_filterable();
    let leaf = registry.get("value").unwrap().leaf(Lookup::Gt, "3").unwrap();
    let row = Tagged {
        label: "a".to_string(),
        value: 5i64,
    };
    assert!(leaf.filter_one(&row));
    let predicate = compile("label == 'a' and value < 10", &registry, &ConditionConfig::default())
        .unwrap();
    assert!(predicate.filter_one(&row));
}
