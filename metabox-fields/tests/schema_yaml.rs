use metabox_fields::{
    sanitize, FieldKind, FieldRegistry, FieldSchema, FieldValue, FieldsError, RawInput,
    SanitizeMode,
};
use tempfile::TempDir;

const COURSE_SCHEMA: &str = r#"
- title: General
  fields:
    - id: _mb_length
      type: text
      label: Length
      placeholder: "e.g. 4 weeks"
    - type: custom-html
      value: "<p>Shown, never saved</p>"
- title: Enrollment
  fields:
    - id: _mb_prerequisites
      type: select
      multi: true
      options:
        - value: "101"
          label: Intro
        - value: "201"
    - id: _mb_enroll_shortcode
      type: text-area
      sanitize: shortcode
- title: Empty
"#;

async fn load(contents: &str) -> metabox_fields::Result<FieldSchema> {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("course.yaml");
    tokio::fs::write(&path, contents).await.unwrap();
    FieldSchema::load(&path).await
}

#[tokio::test]
async fn loads_tabs_and_fields_in_order() {
    let schema = load(COURSE_SCHEMA).await.unwrap();
    assert_eq!(schema.len(), 3);

    let titles: Vec<_> = schema.tabs().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["General", "Enrollment", "Empty"]);
    assert!(schema.tabs()[2].fields.is_empty());

    let ids: Vec<_> = schema
        .persistable_fields()
        .filter_map(|f| f.persist_key())
        .collect();
    assert_eq!(ids, ["_mb_length", "_mb_prerequisites", "_mb_enroll_shortcode"]);

    let shortcode = schema.tabs()[1].fields[1].clone();
    assert_eq!(shortcode.sanitize_mode(), SanitizeMode::QuotePreserving);
    assert_eq!(
        schema.tabs()[0].fields[0].extra.get("placeholder"),
        None,
        "placeholder is a typed option, not an extra"
    );
}

#[tokio::test]
async fn every_declared_type_resolves_and_renders() {
    let schema = load(COURSE_SCHEMA).await.unwrap();
    let registry = FieldRegistry::with_defaults();

    for field in schema.fields() {
        let resolved = registry.resolve(&field.type_).unwrap();
        let markup = resolved.render(field, None);
        assert!(markup.starts_with("<li"), "{markup}");
    }

    let select = &schema.tabs()[1].fields[0];
    let markup = registry
        .resolve(&select.type_)
        .unwrap()
        .render(select, Some(&FieldValue::List(vec!["201".into()])));
    assert!(markup.contains(r#"name="_mb_prerequisites[]""#));
    assert!(markup.contains("Intro"));

    assert_eq!(
        registry.resolve("text-area").unwrap().kind,
        FieldKind::TextArea
    );
}

#[tokio::test]
async fn loaded_descriptors_drive_sanitization() {
    let schema = load(COURSE_SCHEMA).await.unwrap();
    let fields: Vec<_> = schema.persistable_fields().cloned().collect();

    assert_eq!(
        sanitize(Some(RawInput::from(r#"<i>4</i> "weeks""#)), &fields[0]),
        FieldValue::from("4 &quot;weeks&quot;")
    );
    assert_eq!(
        sanitize(Some(RawInput::from("101")), &fields[1]),
        FieldValue::List(vec!["101".into()])
    );
    assert_eq!(
        sanitize(Some(RawInput::from(r#"[enroll id="7"]"#)), &fields[2]),
        FieldValue::from(r#"[enroll id="7"]"#)
    );
    assert_eq!(sanitize(None, &fields[1]), FieldValue::empty());
}

#[tokio::test]
async fn missing_and_malformed_files_are_errors() {
    let tmp = TempDir::new().unwrap();
    let missing = FieldSchema::load(tmp.path().join("nope.yaml")).await;
    assert!(matches!(missing, Err(FieldsError::SchemaNotFound { .. })));

    let not_a_list = load("title: General\n").await;
    assert!(matches!(not_a_list, Err(FieldsError::MalformedSchema { .. })));

    let field_without_type = load("- title: General\n  fields:\n    - id: x\n").await;
    assert!(matches!(
        field_without_type,
        Err(FieldsError::MalformedSchema { .. })
    ));
}

#[test]
fn malformed_documents_never_load() {
    let tmp = TempDir::new().unwrap();
    let cases = [
        ("empty", ""),
        ("mapping", "title: General\n"),
        ("scalar", "just text\n"),
        ("tab_without_title", "- fields: []\n"),
        ("fields_not_a_list", "- title: A\n  fields: nope\n"),
    ];

    for (name, contents) in cases {
        let path = tmp.path().join(format!("{name}.yaml"));
        std::fs::write(&path, contents).unwrap();
        let result = tokio_test::block_on(FieldSchema::load(&path));
        assert!(
            matches!(result, Err(FieldsError::MalformedSchema { .. })),
            "{name}: {result:?}"
        );
    }
}
