//! Built-in field renderers.
//!
//! These produce plain, escaped markup so a panel works out of the box. Hosts
//! with their own widget templates rebind kinds through
//! [`FieldRegistry::register`](crate::FieldRegistry::register).

use std::fmt::Write;
use std::sync::Arc;

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};

use crate::registry::{FieldKind, Renderer};
use crate::types::{FieldDescriptor, FieldValue};

/// The built-in renderer for a kind.
pub fn builtin(kind: FieldKind) -> Arc<dyn Renderer> {
    match kind {
        FieldKind::Text => Arc::new(InputRenderer::new(kind, "text")),
        FieldKind::Number => Arc::new(InputRenderer::new(kind, "number")),
        FieldKind::Date => Arc::new(InputRenderer::new(kind, "date")),
        FieldKind::Color => Arc::new(InputRenderer::new(kind, "color")),
        FieldKind::TextArea | FieldKind::Wysiwyg => Arc::new(TextAreaRenderer { kind }),
        FieldKind::Checkbox => Arc::new(CheckboxRenderer),
        FieldKind::Select => Arc::new(ChoiceRenderer { radio: false }),
        FieldKind::Radio => Arc::new(ChoiceRenderer { radio: true }),
        FieldKind::Hidden => Arc::new(HiddenRenderer),
        FieldKind::CustomHtml => Arc::new(CustomHtmlRenderer),
    }
}

/// Value to show: the stored value, else the declared default.
fn current<'a>(field: &'a FieldDescriptor, value: Option<&'a FieldValue>) -> Option<&'a FieldValue> {
    value.or(field.default.as_ref())
}

fn current_text<'a>(field: &'a FieldDescriptor, value: Option<&'a FieldValue>) -> &'a str {
    current(field, value)
        .and_then(FieldValue::as_text)
        .unwrap_or_default()
}

/// Stored text is already entity-encoded by the sanitizer. Decode before
/// escaping so a value rendered and posted back unchanged stays the same.
fn stored_attribute(text: &str) -> String {
    encode_double_quoted_attribute(&decode_html_entities(text)).into_owned()
}

fn stored_text(text: &str) -> String {
    encode_text(&decode_html_entities(text)).into_owned()
}

fn field_name(field: &FieldDescriptor) -> String {
    let id = field.persist_key().unwrap_or_default();
    if field.multi {
        format!("{id}[]")
    } else {
        id.to_string()
    }
}

/// Wrap a widget in the list item every field shares: label, widget, description.
fn wrap(kind: FieldKind, field: &FieldDescriptor, widget: &str) -> String {
    let mut out = String::new();
    let _ = write!(out, r#"<li class="mb-field mb-field-{}"#, kind.slug());
    if let Some(class) = &field.class {
        let _ = write!(out, " {}", encode_double_quoted_attribute(class));
    }
    out.push_str(r#"">"#);
    if let Some(label) = &field.label {
        let _ = write!(
            out,
            r#"<label for="{}">{}</label>"#,
            encode_double_quoted_attribute(field.persist_key().unwrap_or_default()),
            encode_text(label)
        );
    }
    out.push_str(widget);
    if let Some(desc) = &field.desc {
        let _ = write!(out, r#"<p class="description">{}</p>"#, encode_text(desc));
    }
    out.push_str("</li>");
    out
}

struct InputRenderer {
    kind: FieldKind,
    input_type: &'static str,
}

impl InputRenderer {
    fn new(kind: FieldKind, input_type: &'static str) -> Self {
        Self { kind, input_type }
    }
}

impl Renderer for InputRenderer {
    fn render(&self, field: &FieldDescriptor, value: Option<&FieldValue>) -> String {
        let id = field.persist_key().unwrap_or_default();
        let mut widget = format!(
            r#"<input type="{}" id="{}" name="{}" value="{}""#,
            self.input_type,
            encode_double_quoted_attribute(id),
            encode_double_quoted_attribute(&field_name(field)),
            stored_attribute(current_text(field, value)),
        );
        if let Some(placeholder) = &field.placeholder {
            let _ = write!(
                widget,
                r#" placeholder="{}""#,
                encode_double_quoted_attribute(placeholder)
            );
        }
        widget.push('>');
        wrap(self.kind, field, &widget)
    }
}

struct TextAreaRenderer {
    kind: FieldKind,
}

impl Renderer for TextAreaRenderer {
    fn render(&self, field: &FieldDescriptor, value: Option<&FieldValue>) -> String {
        let id = field.persist_key().unwrap_or_default();
        let widget = format!(
            r#"<textarea id="{}" name="{}" class="mb-{}">{}</textarea>"#,
            encode_double_quoted_attribute(id),
            encode_double_quoted_attribute(&field_name(field)),
            self.kind.slug(),
            stored_text(current_text(field, value)),
        );
        wrap(self.kind, field, &widget)
    }
}

struct CheckboxRenderer;

impl Renderer for CheckboxRenderer {
    fn render(&self, field: &FieldDescriptor, value: Option<&FieldValue>) -> String {
        let id = field.persist_key().unwrap_or_default();
        let on = field.value.as_deref().unwrap_or("yes");
        let checked = current(field, value).is_some_and(|v| v.contains(on));
        let widget = format!(
            r#"<input type="checkbox" id="{}" name="{}" value="{}"{}>"#,
            encode_double_quoted_attribute(id),
            encode_double_quoted_attribute(&field_name(field)),
            encode_double_quoted_attribute(on),
            if checked { " checked" } else { "" },
        );
        wrap(FieldKind::Checkbox, field, &widget)
    }
}

struct ChoiceRenderer {
    radio: bool,
}

impl ChoiceRenderer {
    fn render_select(&self, field: &FieldDescriptor, value: Option<&FieldValue>) -> String {
        let id = field.persist_key().unwrap_or_default();
        let mut widget = format!(
            r#"<select id="{}" name="{}"{}>"#,
            encode_double_quoted_attribute(id),
            encode_double_quoted_attribute(&field_name(field)),
            if field.multi { " multiple" } else { "" },
        );
        let selected = current(field, value);
        for option in &field.options {
            let is_selected = selected.is_some_and(|v| v.contains(&option.value));
            let _ = write!(
                widget,
                r#"<option value="{}"{}>{}</option>"#,
                encode_double_quoted_attribute(&option.value),
                if is_selected { " selected" } else { "" },
                encode_text(option.display_label()),
            );
        }
        widget.push_str("</select>");
        wrap(FieldKind::Select, field, &widget)
    }

    fn render_radio(&self, field: &FieldDescriptor, value: Option<&FieldValue>) -> String {
        let name = field_name(field);
        let selected = current(field, value);
        let mut widget = String::new();
        for option in &field.options {
            let is_selected = selected.is_some_and(|v| v.contains(&option.value));
            let _ = write!(
                widget,
                r#"<label><input type="radio" name="{}" value="{}"{}> {}</label>"#,
                encode_double_quoted_attribute(&name),
                encode_double_quoted_attribute(&option.value),
                if is_selected { " checked" } else { "" },
                encode_text(option.display_label()),
            );
        }
        wrap(FieldKind::Radio, field, &widget)
    }
}

impl Renderer for ChoiceRenderer {
    fn render(&self, field: &FieldDescriptor, value: Option<&FieldValue>) -> String {
        if self.radio {
            self.render_radio(field, value)
        } else {
            self.render_select(field, value)
        }
    }
}

struct HiddenRenderer;

impl Renderer for HiddenRenderer {
    fn render(&self, field: &FieldDescriptor, value: Option<&FieldValue>) -> String {
        format!(
            r#"<input type="hidden" id="{}" name="{}" value="{}">"#,
            encode_double_quoted_attribute(field.persist_key().unwrap_or_default()),
            encode_double_quoted_attribute(&field_name(field)),
            stored_attribute(current_text(field, value)),
        )
    }
}

/// Emits the field's static `value` as-is; it is declared by the panel author.
struct CustomHtmlRenderer;

impl Renderer for CustomHtmlRenderer {
    fn render(&self, field: &FieldDescriptor, _value: Option<&FieldValue>) -> String {
        wrap(
            FieldKind::CustomHtml,
            field,
            field.value.as_deref().unwrap_or_default(),
        )
    }
}
