//! End-to-end substitution behaviour
//!
//! Covers binding validation, unresolved-token handling, duplicate values and
//! typed serialization through the public API.

use std::sync::Arc;

use feedshot::substitution::{segments, Segment};
use feedshot::{
    apply_variables, substitute, Bindings, PlaceholderBinding, PlaceholderDefinition,
    PlaceholderType, SubstitutionConfig, SubstitutionError, Template, TemplateKind,
    UnresolvedPlaceholder, UnresolvedPlaceholderError, Value,
};
use pretty_assertions::assert_eq;

fn nickname() -> Arc<PlaceholderDefinition> {
    Arc::new(PlaceholderDefinition::text("nickname").required())
}

fn single(def: Arc<PlaceholderDefinition>, value: Option<Value>) -> Bindings {
    std::iter::once(PlaceholderBinding::new(def, value)).collect()
}

#[test]
fn test_hello_alice() {
    let bindings = single(nickname(), Some(Value::from("Alice")));
    let out = substitute("Hello {{nickname}}", &bindings, &SubstitutionConfig::default()).unwrap();
    insta::assert_snapshot!(out, @"Hello Alice");
}

#[test]
fn test_required_without_value_blocks_substitution() {
    let binding = PlaceholderBinding::new(nickname(), None);
    let issue = binding.validate().unwrap_err();
    assert_eq!(
        issue.message,
        "placeholder 'nickname' is required but has no value"
    );

    let bindings = single(nickname(), None);
    let err = substitute("Hello {{nickname}}", &bindings, &SubstitutionConfig::default())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "validation failed: placeholder 'nickname' is required but has no value"
    );
}

#[test]
fn test_required_with_default_is_valid() {
    let def = Arc::new(
        PlaceholderDefinition::text("nickname")
            .required()
            .with_default("Bob"),
    );
    let bindings = single(def, None);
    let out = substitute("Hi {{ nickname }}!", &bindings, &SubstitutionConfig::default()).unwrap();
    assert_eq!(out, "Hi Bob!");
}

#[test]
fn test_number_accepts_numeric_kinds_only() {
    let def = Arc::new(PlaceholderDefinition::new("likes", PlaceholderType::Number));
    for value in [
        Value::Integer(12),
        Value::Float(1.5),
        Value::Decimal("3.25".parse().unwrap()),
    ] {
        assert!(PlaceholderBinding::new(def.clone(), Some(value)).validate().is_ok());
    }
    assert!(PlaceholderBinding::new(def, Some(Value::from("twelve")))
        .validate()
        .is_err());
}

#[test]
fn test_unresolved_token_kept_by_default() {
    let markup = r#"<text x="1">{{unknown}}</text>"#;
    let out = substitute(markup, &Bindings::new(), &SubstitutionConfig::default()).unwrap();
    assert_eq!(out, markup);
}

#[test]
fn test_unresolved_token_fails_when_strict() {
    let markup = "<text>{{a}} {{unknown}} {{unknown}}</text>";
    let bindings = single(
        Arc::new(PlaceholderDefinition::text("a")),
        Some(Value::from("x")),
    );
    let err = substitute(markup, &bindings, &SubstitutionConfig::new().strict()).unwrap_err();
    assert_eq!(
        err,
        SubstitutionError::Unresolved(UnresolvedPlaceholderError {
            placeholders: vec![UnresolvedPlaceholder {
                name: "unknown".to_string(),
                span: 12..23,
            }],
        })
    );
    assert_eq!(err.to_string(), "unresolved placeholders: unknown");
}

#[test]
fn test_strict_error_report_points_at_token() {
    let err = substitute("<t>{{who}}</t>", &Bindings::new(), &SubstitutionConfig::new().strict())
        .unwrap_err();
    let report = err.format("<t>{{who}}</t>", "card.svg");
    assert!(report.contains("card.svg"));
    assert!(report.contains("no value is bound to 'who'"));
}

#[test]
fn test_last_write_wins_for_duplicate_values() {
    let template = Template::new(TemplateKind::Other, "t", "{{nickname}}")
        .with_placeholders([PlaceholderDefinition::text("nickname")])
        .unwrap();
    let out = apply_variables(
        &template,
        [
            ("nickname", Value::from("Alice")),
            ("nickname", Value::from("Bob")),
        ],
        &SubstitutionConfig::default(),
    )
    .unwrap();
    assert_eq!(out, "Bob");
}

#[test]
fn test_substitution_is_idempotent() {
    let bindings = single(nickname(), Some(Value::from("Alice")));
    let config = SubstitutionConfig::default();
    let once = substitute("<t>{{nickname}}</t>", &bindings, &config).unwrap();
    let twice = substitute(&once, &bindings, &config).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_all_issues_reported_in_markup_order() {
    let template = Template::new(
        TemplateKind::Other,
        "t",
        "{{battery}} {{network}} {{nickname}}",
    )
    .with_placeholders([
        PlaceholderDefinition::text("nickname").required(),
        PlaceholderDefinition::new("network", PlaceholderType::Enum).with_options(["4G", "5G"]),
        PlaceholderDefinition::new("battery", PlaceholderType::Number)
            .with_bounds(Some(0.0), Some(100.0)),
    ])
    .unwrap();
    let err = apply_variables(
        &template,
        [
            ("battery", Value::Integer(120)),
            ("network", Value::from("3G")),
        ],
        &SubstitutionConfig::default(),
    )
    .unwrap_err();
    let SubstitutionError::Validation(err) = err else {
        panic!("expected a validation error");
    };
    let names: Vec<&str> = err.issues.iter().map(|i| i.placeholder.as_str()).collect();
    assert_eq!(names, vec!["battery", "network", "nickname"]);
}

#[test]
fn test_typed_values_serialize_into_markup() {
    let template = Template::new(
        TemplateKind::Other,
        "t",
        r#"<text fill="{{accent}}">{{posted_at}} {{likes}} {{price}} {{content}}</text>"#,
    )
    .with_placeholders([
        PlaceholderDefinition::new("accent", PlaceholderType::Color),
        PlaceholderDefinition::new("posted_at", PlaceholderType::DateTime).with_format("%H:%M"),
        PlaceholderDefinition::new("likes", PlaceholderType::List),
        PlaceholderDefinition::new("price", PlaceholderType::Number),
        PlaceholderDefinition::new("content", PlaceholderType::RichText),
    ])
    .unwrap();
    let posted = chrono::DateTime::parse_from_rfc3339("2024-05-01T21:07:00+08:00").unwrap();
    let out = apply_variables(
        &template,
        [
            ("accent", Value::Color("like".into())),
            ("posted_at", Value::from(posted)),
            (
                "likes",
                Value::List(vec![Value::from("Ann"), Value::from("Bo & Co")]),
            ),
            ("price", Value::Decimal("19.90".parse().unwrap())),
            ("content", Value::RichText("a\nb".into())),
        ],
        &SubstitutionConfig::default(),
    )
    .unwrap();
    insta::assert_snapshot!(out, @r##"<text fill="#fa5151">21:07 Ann, Bo &amp; Co 19.90 a&#10;b</text>"##);
}

#[test]
fn test_tokenizer_segments() {
    let parts: Vec<String> = segments("a {{ b }} {{c d}} {{{e}}}")
        .map(|segment| match segment {
            Segment::Literal { text, .. } => format!("lit({})", text),
            Segment::Placeholder { name, .. } => format!("ph({})", name),
        })
        .collect();
    assert_eq!(
        parts,
        vec!["lit(a )", "ph(b)", "lit( {{c d}} {)", "ph(e)", "lit(})"]
    );
}
