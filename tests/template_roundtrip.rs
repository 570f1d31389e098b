//! Template persistence, built-in defaults and lint through the manager

use feedshot::template::{default_template, lint, TemplateLintCategory};
use feedshot::{
    ArgumentError, PlaceholderDefinition, PlaceholderType, SubstitutionConfig, Template,
    TemplateError, TemplateKind, TemplateManager, Value,
};
use pretty_assertions::assert_eq;

fn curated() -> Template {
    Template::new(
        TemplateKind::Moment,
        "curated",
        r##"<svg viewBox="0 0 390 844"><rect width="100%" height="100%" fill="#fff"/><text>{{nickname}} {{likes}} {{posted_at}}</text></svg>"##,
    )
    .with_placeholders([
        PlaceholderDefinition::text("nickname").required(),
        PlaceholderDefinition::new("likes", PlaceholderType::Number)
            .with_bounds(Some(0.0), None)
            .with_default(0),
        PlaceholderDefinition::new("posted_at", PlaceholderType::DateTime)
            .with_format("%Y-%m-%d")
            .with_description("Publication date"),
    ])
    .unwrap()
    .with_metadata("author", "qa")
    .with_metadata("theme", "light")
}

#[test]
fn test_json_round_trip_preserves_everything() {
    let original = curated();
    let mut manager = TemplateManager::new();
    let id = manager.insert(original.clone()).unwrap();
    let json = manager.export_json(id).unwrap();

    let mut other = TemplateManager::new();
    let imported_id = other.import_json(&json).unwrap();
    let imported = other.get(imported_id).unwrap();

    assert_eq!(imported_id, original.id());
    assert_eq!(imported.kind, original.kind);
    assert_eq!(imported.markup(), original.markup());
    assert_eq!(imported.metadata, original.metadata);
    assert_eq!(imported.placeholders(), original.placeholders());
    assert_eq!(imported, &original);
}

#[test]
fn test_round_trip_with_infinite_default() {
    let template = Template::new(TemplateKind::Other, "ratio", "<svg>{{ratio}}</svg>")
        .with_placeholders([PlaceholderDefinition::new("ratio", PlaceholderType::Number)
            .with_default(Value::Float(f64::INFINITY))])
        .unwrap();
    let mut manager = TemplateManager::new();
    let id = manager.insert(template.clone()).unwrap();
    let json = manager.export_json(id).unwrap();

    let mut other = TemplateManager::new();
    let imported = other.import_json(&json).unwrap();
    assert_eq!(other.get(imported), Some(&template));
}

#[test]
fn test_persisted_shape() {
    let mut manager = TemplateManager::new();
    let id = manager.insert(curated()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&manager.export_json(id).unwrap()).unwrap();

    assert_eq!(json["kind"], "moment");
    assert_eq!(json["placeholders"][0]["name"], "nickname");
    assert_eq!(json["placeholders"][0]["required"], true);
    assert_eq!(json["placeholders"][1]["type"], "number");
    assert_eq!(
        json["placeholders"][1]["default_value"],
        serde_json::json!({"kind": "integer", "value": 0})
    );
    assert_eq!(json["placeholders"][2]["type"], "date_time");
    assert_eq!(json["metadata"]["author"], "qa");
}

#[test]
fn test_file_round_trip_with_base_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = TemplateManager::with_base_path(dir.path().to_path_buf());
    let id = manager.insert(curated()).unwrap();
    let path = manager.export_file(id, "curated.json").unwrap();
    assert_eq!(path, dir.path().join("curated.json"));

    let mut other = TemplateManager::with_base_path(dir.path().to_path_buf());
    let imported = other.import_file("curated.json").unwrap();
    assert_eq!(other.get(imported), manager.get(id));
}

#[test]
fn test_import_rejects_duplicate_id_and_bad_json() {
    let mut manager = TemplateManager::new();
    let id = manager.insert(curated()).unwrap();
    let json = manager.export_json(id).unwrap();

    assert!(matches!(
        manager.import_json(&json),
        Err(TemplateError::Duplicate { .. })
    ));
    assert!(matches!(
        manager.import_json("{\"kind\": \"moment\"}"),
        Err(TemplateError::Import(_))
    ));
}

fn with_placeholder_names(names: &[&str]) -> String {
    let mut json = serde_json::to_value(curated()).unwrap();
    json["placeholders"] = names
        .iter()
        .map(|name| serde_json::json!({"name": name, "type": "text"}))
        .collect();
    json.to_string()
}

#[test]
fn test_import_rejects_repeated_placeholder_names() {
    let mut manager = TemplateManager::new();
    let err = manager
        .import_json(&with_placeholder_names(&["nickname", "nickname"]))
        .unwrap_err();
    assert!(matches!(
        err,
        TemplateError::Argument(ArgumentError::DuplicatePlaceholder { ref name, .. })
            if name == "nickname"
    ));
    assert!(manager.is_empty());
}

#[test]
fn test_import_rejects_empty_placeholder_name() {
    let mut manager = TemplateManager::new();
    let err = manager
        .import_json(&with_placeholder_names(&["nickname", ""]))
        .unwrap_err();
    assert_eq!(err.to_string(), "'' is not a valid placeholder name");
    assert!(manager.is_empty());
}

#[test]
fn test_import_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = TemplateManager::with_base_path(dir.path().to_path_buf());
    let err = manager.import_file("absent.json").unwrap_err();
    assert!(matches!(err, TemplateError::Io { ref path, .. } if path.ends_with("absent.json")));
}

#[test]
fn test_defaults_render_with_their_own_defaults() {
    let mut manager = TemplateManager::new();
    manager.ensure_defaults().unwrap();

    let chat = manager.list_by_kind(TemplateKind::Chat)[0].id();
    let markup = manager
        .apply_variables(
            chat,
            [
                ("contact_name", Value::from("Mia")),
                ("contact_avatar", Value::ImagePath("mia.png".into())),
                ("message", Value::RichText("hi <3".into())),
            ],
            &SubstitutionConfig::new().strict(),
        )
        .unwrap();

    assert!(markup.contains(">9:41<"));
    assert!(markup.contains(">5G<"));
    assert!(markup.contains(">100%<"));
    assert!(markup.contains("hi &lt;3"));
    assert!(markup.contains(r#"href="mia.png""#));
    assert!(!markup.contains("{{"));
}

#[test]
fn test_default_templates_lint_clean() {
    for kind in [TemplateKind::Moment, TemplateKind::Chat, TemplateKind::Profile] {
        let template = default_template(kind).unwrap();
        assert_eq!(lint::check(&template), Vec::new(), "{}", kind);
    }
}

#[test]
fn test_lint_after_markup_edit() {
    let mut manager = TemplateManager::new();
    let id = manager
        .create(TemplateKind::Other, "card", "<svg>{{title}}</svg>")
        .unwrap();
    manager
        .update(id, |t| t.update_markup("<svg>{{headline}}</svg>"))
        .unwrap();

    let warnings = lint::check(manager.get(id).unwrap());
    let categories: Vec<_> = warnings.iter().map(|w| w.category).collect();
    assert_eq!(
        categories,
        vec![TemplateLintCategory::Undeclared, TemplateLintCategory::Unused]
    );

    let template = manager
        .update(id, |t| {
            t.remove_placeholder("title");
            t.rescan_placeholders();
        })
        .unwrap();
    assert!(lint::check(template).is_empty());
}

#[test]
fn test_update_bumps_timestamp_and_keeps_identity() {
    let mut manager = TemplateManager::new();
    let id = manager.insert(curated()).unwrap();
    let before = manager.get(id).unwrap().updated_at;
    let created = manager.get(id).unwrap().created_at;

    let after = manager
        .try_update(id, |t| {
            t.add_or_replace_placeholder(PlaceholderDefinition::text("nickname"))
        })
        .unwrap();
    assert_eq!(after.id(), id);
    assert_eq!(after.created_at, created);
    assert!(after.updated_at >= before);
    assert!(!after.placeholder("nickname").unwrap().required);
    assert_eq!(after.placeholders()[0].name, "nickname");
}
