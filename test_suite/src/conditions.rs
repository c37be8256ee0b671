use condition_query::ast::Expression;
use condition_query::grammar::GrammarError;
use condition_query::parsing::parse;
use condition_query::*;

#[derive(Debug, Clone, PartialEq, Filterable)]
struct Stock {
    #[condition(op(in, not_in))]
    code: String,
    #[condition(op(lt, lte, gt, gte))]
    price: f64,
    #[condition(op(lt, lte, gt, gte))]
    eps: f64,
    #[condition(op(lt, lte, gt, gte))]
    er: f64,
}

fn stock(code: &str, price: f64, eps: f64, er: f64) -> Stock {
    Stock {
        code: code.to_string(),
        price,
        eps,
        er,
    }
}

fn stocks() -> Vec<Stock> {
    vec![
        stock("100", 100.0, 0.1, 0.4),
        stock("600", 250.0, 0.1, 0.6),
        stock("200", 300.0, 0.3, 0.9),
        stock("300", 50.0, 0.5, 0.1),
    ]
}

fn registry() -> FieldRegistry<Stock> {
    FieldRegistry::from_filterable()
}

fn codes(predicate: &Predicate<Stock>) -> Vec<String> {
    let mut rows = stocks();
    predicate.filter_vec(&mut rows);
    rows.into_iter().map(|s| s.code).collect()
}

fn validate(expression: &Expression) -> Result<(), ConditionError> {
    ConditionValidator::new(&registry()).validate(expression)
}

fn build(expression: &Expression) -> Result<Predicate<Stock>, BuildError> {
    PredicateBuilder::new(&registry()).build(expression)
}

#[test_log::test]
fn end_to_end() {
    let registry = FieldRegistry::<Stock>::from_filterable();
    let predicate = compile(
        "price < 500 and code == \"600\"",
        &registry,
        &ConditionConfig::default(),
    )
    .unwrap();
    let mut rows = vec![
        stock("100", 100.0, 0.0, 0.0),
        stock("600", 250.0, 0.0, 0.0),
        stock("200", 300.0, 0.0, 0.0),
    ];
    predicate.filter_vec(&mut rows);
    assert_eq!(rows, vec![stock("600", 250.0, 0.0, 0.0)]);
}

#[test_log::test]
fn valid_conditions_validate() {
    for text in [
        "price == 100",
        "price != 100",
        "price < 100 and eps <= 0.2",
        "price > 100 or er >= 0.5",
        "code in '60' or code not in '0'",
        "(price < 100 or eps < 0.2) and er > 0.5",
        "10 < price <= 20",
        "price < 100 and (eps < 10 or er < 1)",
    ] {
        let expression = parse(text).unwrap();
        assert!(validate(&expression).is_ok(), "{}", text);
        assert!(build(&expression).is_ok(), "{}", text);
    }
}

#[test_log::test]
fn disallowed_kinds_fail_both_passes() {
    for (text, kind) in [
        ("a + b", "BinOp"),
        ("f(x)", "Call"),
        ("a.b", "Attribute"),
        ("price < 1 and price * 2 < 3", "BinOp"),
        ("price < abs(eps)", "Call"),
        ("not price < 1", "UnaryOp"),
        ("code in ['600']", "List"),
    ] {
        let expression = parse(text).unwrap();
        let err = validate(&expression).unwrap_err();
        assert_eq!(err.to_string(), format!("Invalid syntax: {}", kind), "{}", text);
        assert!(
            matches!(
                build(&expression),
                Err(BuildError::Grammar(GrammarError::Disallowed(k))) if k == kind
            ),
            "{}",
            text
        );
    }
}

#[test_log::test]
fn swapped_operands_mirror_the_operator() {
    for (swapped, written) in [
        ("100 < price", "price > 100"),
        ("100 <= price", "price >= 100"),
        ("100 > price", "price < 100"),
        ("100 >= price", "price <= 100"),
        ("100 == price", "price == 100"),
        ("100 != price", "price != 100"),
        ("'0' in code", "code in '0'"),
        ("'0' not in code", "code not in '0'"),
    ] {
        let swapped_predicate = build(&parse(swapped).unwrap()).unwrap();
        let written_predicate = build(&parse(written).unwrap()).unwrap();
        assert_eq!(swapped_predicate.to_string(), written_predicate.to_string());
        assert_eq!(codes(&swapped_predicate), codes(&written_predicate));
    }
}

#[test_log::test]
fn validation_is_idempotent() {
    let registry = registry();
    let mut validator = ConditionValidator::new(&registry);
    let good = parse("price < 100").unwrap();
    let bad = parse("unknown_field == \"x\"").unwrap();
    for _ in 0..2 {
        assert!(validator.validate(&good).is_ok());
        let err = validator.validate(&bad).unwrap_err();
        assert!(matches!(err, ConditionError::UnknownField(_)));
        assert!(err.to_string().contains("unknown_field does not exist"));
    }
}

#[test_log::test]
fn chained_comparison() {
    let expression = parse("10 < price <= 20").unwrap();
    assert!(validate(&expression).is_ok());
    let predicate = build(&expression).unwrap();
    assert_eq!(predicate.to_string(), "(price__gt=10 AND price__lte=20)");
    let chained = parse("100 <= price < 300").unwrap();
    assert_eq!(codes(&build(&chained).unwrap()), vec!["100", "600"]);
}

#[test_log::test]
fn disallowed_operator() {
    let err = validate(&parse("code < \"1200\"").unwrap()).unwrap_err();
    assert!(matches!(err, ConditionError::InvalidOperator { .. }));
    assert!(err
        .to_string()
        .contains("Invalid operator between code and 1200"));
}

#[test_log::test]
fn and_binds_tighter_than_or() {
    let loose = build(&parse("price < 100 or eps < 0.2 and er > 0.5").unwrap()).unwrap();
    assert_eq!(
        loose.to_string(),
        "(price__lt=100 OR (eps__lt=0.2 AND er__gt=0.5))"
    );
    let grouped = build(&parse("(price < 100 or eps < 0.2) and er > 0.5").unwrap()).unwrap();
    assert_eq!(
        grouped.to_string(),
        "((price__lt=100 OR eps__lt=0.2) AND er__gt=0.5)"
    );
    assert_eq!(codes(&loose), vec!["600", "300"]);
    assert_eq!(codes(&grouped), vec!["600"]);
}

#[test_log::test]
fn error_categories_are_distinct() {
    let cases = [
        ("price <", "Syntax"),
        ("price + 1 < 2", "Syntax"),
        ("volume < 1", "UnknownField"),
        ("price < 'cheap'", "InvalidValue"),
        ("code >= '1'", "InvalidOperator"),
    ];
    let registry = registry();
    for (text, category) in cases {
        let err = validate_condition(text, &registry, &ConditionConfig::default()).unwrap_err();
        let found = match err {
            ConditionError::Syntax(_) => "Syntax",
            ConditionError::UnknownField(_) => "UnknownField",
            ConditionError::InvalidValue { .. } => "InvalidValue",
            ConditionError::InvalidOperator { .. } => "InvalidOperator",
            ConditionError::Limit(_) => "Limit",
            ConditionError::Build(_) => "Build",
        };
        assert_eq!(found, category, "{}", text);
    }
}

#[test_log::test]
fn predicates_compose() {
    let registry = registry();
    let config = ConditionConfig::default();
    let cheap = || compile("price < 200", &registry, &config).unwrap();
    let growing = || compile("er > 0.5", &registry, &config).unwrap();
    assert_eq!(codes(&(cheap() | growing())), vec!["100", "600", "200", "300"]);
    assert_eq!(codes(&(cheap() & !growing())), vec!["100", "300"]);
    assert_eq!(codes(&(cheap() & growing())), Vec::<String>::new());
}
