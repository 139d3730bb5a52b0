//! Sanitization policy for submitted field values.
//!
//! Given a descriptor and whatever raw input was posted for it, decide which
//! flags apply and produce a storable [`FieldValue`]. Everything here is pure.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{FieldDescriptor, FieldValue, SanitizeMode};

/// Raw submitted input for one key, before cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    Scalar(String),
    List(Vec<String>),
}

impl From<&str> for RawInput {
    fn from(value: &str) -> Self {
        RawInput::Scalar(value.to_string())
    }
}

impl From<String> for RawInput {
    fn from(value: String) -> Self {
        RawInput::Scalar(value)
    }
}

impl From<Vec<String>> for RawInput {
    fn from(value: Vec<String>) -> Self {
        RawInput::List(value)
    }
}

impl From<Vec<&str>> for RawInput {
    fn from(value: Vec<&str>) -> Self {
        RawInput::List(value.into_iter().map(str::to_string).collect())
    }
}

/// The sanitizer flags that apply to one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeFlags {
    /// Entity-encode `"` and `'`.
    pub encode_quotes: bool,
    /// The value is a list; scalars are coerced to one element.
    pub require_array: bool,
}

impl SanitizeFlags {
    /// Flags for a descriptor. Quote preservation wins over `multi`.
    pub fn for_field(field: &FieldDescriptor) -> Self {
        match field.sanitize_mode() {
            SanitizeMode::QuotePreserving => Self {
                encode_quotes: false,
                require_array: false,
            },
            SanitizeMode::Default => Self {
                encode_quotes: true,
                require_array: field.multi,
            },
        }
    }
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:!--.*?-->|[A-Za-z/!?][^>]*>?)").expect("tag pattern is valid")
});

/// Strip markup tags and NUL bytes, then entity-encode what remains.
///
/// `&`, `<` and `>` are always encoded; quotes only when `encode_quotes`.
pub fn clean_text(input: &str, encode_quotes: bool) -> String {
    let without_nul: Cow<'_, str> = if input.contains('\0') {
        Cow::Owned(input.replace('\0', ""))
    } else {
        Cow::Borrowed(input)
    };
    let stripped = TAG_RE.replace_all(&without_nul, "");
    if encode_quotes {
        html_escape::encode_quoted_attribute(&stripped).into_owned()
    } else {
        html_escape::encode_text(&stripped).into_owned()
    }
}

/// Sanitize the raw input posted for `field`.
///
/// - nothing posted: the empty string
/// - quote-preserving: a scalar with quotes left literal
/// - `multi`: a list, each element cleaned; a posted scalar becomes one element
/// - otherwise: a cleaned scalar; a posted list is rejected as the empty string
pub fn sanitize(raw: Option<RawInput>, field: &FieldDescriptor) -> FieldValue {
    let Some(raw) = raw else {
        return FieldValue::empty();
    };
    let flags = SanitizeFlags::for_field(field);

    if flags.require_array {
        let items = match raw {
            RawInput::List(items) => items,
            RawInput::Scalar(item) => vec![item],
        };
        return FieldValue::List(
            items
                .iter()
                .map(|item| clean_text(item, flags.encode_quotes))
                .collect(),
        );
    }

    match raw {
        RawInput::Scalar(value) => FieldValue::Text(clean_text(&value, flags.encode_quotes)),
        RawInput::List(_) => {
            tracing::debug!(
                field = field.persist_key().unwrap_or_default(),
                "list submitted for a single-value field, storing empty value"
            );
            FieldValue::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_field() -> FieldDescriptor {
        FieldDescriptor::new("text").with_id("_mb_title")
    }

    #[test]
    fn absent_input_is_empty_string() {
        assert_eq!(sanitize(None, &text_field()), FieldValue::empty());

        let multi = FieldDescriptor::new("select").with_id("_mb_tags").with_multi(true);
        assert_eq!(sanitize(None, &multi), FieldValue::empty());
    }

    #[test]
    fn default_escaping_neutralizes_markup_and_quotes() {
        let value = sanitize(Some(r#"<b class="x">"hi"</b>"#.into()), &text_field());
        let text = value.as_text().unwrap();
        assert!(!text.contains('<'));
        assert!(!text.contains('"'));
        assert_eq!(text, "&quot;hi&quot;");

        let value = sanitize(Some("<b>hi</b>".into()), &text_field());
        assert_eq!(value, FieldValue::from("hi"));
    }

    #[test]
    fn single_quotes_are_encoded_by_default() {
        let value = sanitize(Some("it's".into()), &text_field());
        let text = value.as_text().unwrap();
        assert!(!text.contains('\''));
        assert!(text.starts_with("it&"));
    }

    #[test]
    fn quote_preserving_keeps_literal_quotes() {
        let field = text_field().with_sanitize(SanitizeMode::QuotePreserving);
        let value = sanitize(Some(r#"He said "hi""#.into()), &field);
        assert_eq!(value, FieldValue::from(r#"He said "hi""#));

        let shortcode = sanitize(Some(r#"[course id="12"]"#.into()), &field);
        assert_eq!(shortcode, FieldValue::from(r#"[course id="12"]"#));
    }

    #[test]
    fn quote_preserving_still_strips_markup() {
        let field = text_field().with_sanitize(SanitizeMode::QuotePreserving);
        let value = sanitize(Some(r#"<script>x</script>"a" & b"#.into()), &field);
        assert_eq!(value, FieldValue::from(r#"x"a" &amp; b"#));
    }

    #[test]
    fn quote_preserving_wins_over_multi() {
        let field = text_field()
            .with_multi(true)
            .with_sanitize(SanitizeMode::QuotePreserving);
        assert_eq!(
            SanitizeFlags::for_field(&field),
            SanitizeFlags {
                encode_quotes: false,
                require_array: false
            }
        );
    }

    #[test]
    fn multi_sanitizes_each_element() {
        let field = FieldDescriptor::new("select").with_id("_mb_tags").with_multi(true);
        let value = sanitize(Some(vec!["a", "<i>b</i>"].into()), &field);
        assert_eq!(value, FieldValue::List(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn multi_coerces_scalar_to_single_element_list() {
        let field = FieldDescriptor::new("select").with_id("_mb_tags").with_multi(true);
        let value = sanitize(Some("a".into()), &field);
        assert_eq!(value, FieldValue::List(vec!["a".into()]));
    }

    #[test]
    fn list_for_scalar_field_is_rejected() {
        let value = sanitize(Some(vec!["a", "b"].into()), &text_field());
        assert_eq!(value, FieldValue::empty());
    }

    #[test]
    fn clean_text_removes_nul_and_comments() {
        assert_eq!(clean_text("a\0b", true), "ab");
        assert_eq!(clean_text("a<!-- hidden -->b", true), "ab");
        assert_eq!(clean_text("1 < 2", true), "1 &lt; 2");
    }
}
