//! Core schema types for metabox panels.
//!
//! A panel declares a [`FieldSchema`]: an ordered list of [`Tab`]s, each holding
//! an ordered list of [`FieldDescriptor`]s. All types serialize to/from YAML via
//! serde so panels can be declared in code or loaded from disk.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::{FieldsError, Result};

/// A stored or sanitized field value.
///
/// Single-value fields hold text; `multi` fields hold a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// The definite empty value stored when nothing was submitted.
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    /// Text content, if this is a single value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    /// List content, if this is a multi value.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::List(items) => Some(items),
        }
    }

    /// True for the empty string and the empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    /// Whether `candidate` is (one of) the current value(s).
    pub fn contains(&self, candidate: &str) -> bool {
        match self {
            FieldValue::Text(s) => s == candidate,
            FieldValue::List(items) => items.iter().any(|i| i == candidate),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

/// A single choice in a select or radio field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: Some(label.into()),
        }
    }

    /// The label shown to the user, falling back to the value.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}

/// Which sanitizer flags a field asks for.
///
/// `shortcode` and `no_encode_quotes` are accepted as older spellings of
/// `quote_preserving`. Unrecognized values fall back to `default`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SanitizeMode {
    #[serde(
        alias = "quote-preserving",
        alias = "no_encode_quotes",
        alias = "shortcode"
    )]
    QuotePreserving,
    #[default]
    #[serde(other)]
    Default,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Declarative metadata for one form field.
///
/// `id` is the persistence key joining submitted input to the stored value.
/// A field without an `id` is render-only and never saved.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanitize: Option<SanitizeMode>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub multi: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Static content for render-only fields such as `custom-html`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Renderer-specific options not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml_ng::Value>,
}

impl FieldDescriptor {
    /// A render-only field of the given type.
    pub fn new(type_: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_sanitize(mut self, mode: SanitizeMode) -> Self {
        self.sanitize = Some(mode);
        self
    }

    pub fn with_multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// The key this field persists under, if it has a non-empty id.
    pub fn persist_key(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Effective sanitize mode; absent means `Default`.
    pub fn sanitize_mode(&self) -> SanitizeMode {
        self.sanitize.unwrap_or_default()
    }
}

/// A named group of fields shown as one section of a panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tab {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl Tab {
    pub fn new(title: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            title: title.into(),
            fields,
        }
    }
}

/// The ordered tabs of a panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FieldSchema {
    tabs: Vec<Tab>,
}

impl FieldSchema {
    pub fn new(tabs: Vec<Tab>) -> Self {
        Self { tabs }
    }

    /// Tabs in declaration order.
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Mutable access for schema filters.
    pub fn tabs_mut(&mut self) -> &mut Vec<Tab> {
        &mut self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Every field across all tabs, in order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.tabs.iter().flat_map(|tab| tab.fields.iter())
    }

    /// Fields eligible for persistence (non-empty `id`), in order.
    pub fn persistable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields().filter(|f| f.persist_key().is_some())
    }

    /// Parse a schema from YAML.
    ///
    /// The document must be a sequence of tabs; anything else is
    /// [`FieldsError::MalformedSchema`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Err(FieldsError::malformed("schema is empty"));
        }
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml)?;
        Self::from_yaml_value(value)
    }

    /// Interpret an already-parsed YAML value as a schema.
    pub fn from_yaml_value(value: serde_yaml_ng::Value) -> Result<Self> {
        if !value.is_sequence() {
            return Err(FieldsError::malformed("expected a sequence of tabs"));
        }
        serde_yaml_ng::from_value(value).map_err(|e| FieldsError::malformed(e.to_string()))
    }

    /// Load a schema from a YAML file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FieldsError::SchemaNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).await?;
        let schema = Self::from_yaml_str(&content)?;
        debug!(?path, tabs = schema.len(), "field schema loaded");
        Ok(schema)
    }
}

impl From<Vec<Tab>> for FieldSchema {
    fn from(tabs: Vec<Tab>) -> Self {
        Self::new(tabs)
    }
}

impl FromIterator<Tab> for FieldSchema {
    fn from_iter<I: IntoIterator<Item = Tab>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_untagged_yaml_round_trip() {
        let text = FieldValue::from("hello");
        let yaml = serde_yaml_ng::to_string(&text).unwrap();
        assert_eq!(serde_yaml_ng::from_str::<FieldValue>(&yaml).unwrap(), text);

        let list = FieldValue::from(vec!["a".to_string(), "b".to_string()]);
        let yaml = serde_yaml_ng::to_string(&list).unwrap();
        assert_eq!(serde_yaml_ng::from_str::<FieldValue>(&yaml).unwrap(), list);
    }

    #[test]
    fn field_value_contains() {
        assert!(FieldValue::from("yes").contains("yes"));
        assert!(!FieldValue::from("yes").contains("no"));
        let list = FieldValue::List(vec!["a".into(), "b".into()]);
        assert!(list.contains("b"));
        assert!(!list.contains("c"));
        assert!(FieldValue::empty().is_empty());
    }

    #[test]
    fn sanitize_mode_accepts_legacy_spellings() {
        for spelling in ["shortcode", "no_encode_quotes", "quote-preserving", "quote_preserving"] {
            let mode: SanitizeMode = serde_yaml_ng::from_str(spelling).unwrap();
            assert_eq!(mode, SanitizeMode::QuotePreserving, "{spelling}");
        }
    }

    #[test]
    fn descriptor_sanitize_spellings_inside_schema() {
        let schema = FieldSchema::from_yaml_str(
            "- title: A\n  fields:\n    - id: a\n      type: text\n      sanitize: shortcode\n    - id: b\n      type: text\n      sanitize: html\n",
        )
        .unwrap();
        let fields: Vec<_> = schema.fields().collect();
        assert_eq!(fields[0].sanitize_mode(), SanitizeMode::QuotePreserving);
        assert_eq!(fields[1].sanitize_mode(), SanitizeMode::Default);
    }

    #[test]
    fn sanitize_mode_unknown_falls_back_to_default() {
        let mode: SanitizeMode = serde_yaml_ng::from_str("html").unwrap();
        assert_eq!(mode, SanitizeMode::Default);
        let mode: SanitizeMode = serde_yaml_ng::from_str("default").unwrap();
        assert_eq!(mode, SanitizeMode::Default);
    }

    #[test]
    fn descriptor_type_renames_to_type_in_yaml() {
        let field = FieldDescriptor::new("text").with_id("_mb_title");
        let yaml = serde_yaml_ng::to_string(&field).unwrap();
        assert!(yaml.contains("type: text"));
        assert!(!yaml.contains("type_"));
        assert!(!yaml.contains("multi"));
    }

    #[test]
    fn descriptor_keeps_extra_options() {
        let yaml = r#"
id: _mb_length
type: number
label: Length
min: 0
step: 5
"#;
        let field: FieldDescriptor = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(field.persist_key(), Some("_mb_length"));
        assert_eq!(field.extra.len(), 2);
        assert!(field.extra.contains_key("min"));
        assert!(field.extra.contains_key("step"));
    }

    #[test]
    fn empty_id_is_not_persistable() {
        let field = FieldDescriptor::new("text").with_id("");
        assert_eq!(field.persist_key(), None);
        assert_eq!(FieldDescriptor::new("custom-html").persist_key(), None);
    }

    #[test]
    fn schema_from_yaml() {
        let yaml = r#"
- title: General
  fields:
    - id: _mb_title
      type: text
      label: Title
    - type: custom-html
      value: "<p>Heads up</p>"
- title: Advanced
  fields:
    - id: _mb_tags
      type: select
      multi: true
      options:
        - value: a
          label: A
        - value: b
- title: Empty
"#;
        let schema = FieldSchema::from_yaml_str(yaml).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.tabs()[0].fields.len(), 2);
        assert!(schema.tabs()[2].fields.is_empty());
        assert_eq!(schema.fields().count(), 3);

        let keys: Vec<_> = schema
            .persistable_fields()
            .filter_map(|f| f.persist_key())
            .collect();
        assert_eq!(keys, vec!["_mb_title", "_mb_tags"]);
        assert_eq!(schema.tabs()[1].fields[0].options[1].display_label(), "b");
    }

    #[test]
    fn schema_rejects_non_sequence() {
        let err = FieldSchema::from_yaml_str("title: General\n").unwrap_err();
        assert!(matches!(err, FieldsError::MalformedSchema { .. }));

        let err = FieldSchema::from_yaml_str("").unwrap_err();
        assert!(matches!(err, FieldsError::MalformedSchema { .. }));
    }

    #[test]
    fn schema_rejects_tab_without_title() {
        let err = FieldSchema::from_yaml_str("- fields: []\n").unwrap_err();
        assert!(matches!(err, FieldsError::MalformedSchema { .. }));
    }

    #[tokio::test]
    async fn schema_load_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("panel.yaml");
        std::fs::write(&path, "- title: Only\n  fields:\n    - id: a\n      type: text\n").unwrap();

        let schema = FieldSchema::load(&path).await.unwrap();
        assert_eq!(schema.len(), 1);

        let missing = FieldSchema::load(tmp.path().join("nope.yaml")).await;
        assert!(matches!(missing, Err(FieldsError::SchemaNotFound { .. })));
    }
}
