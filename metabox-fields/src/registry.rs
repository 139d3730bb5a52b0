//! Field type registry.
//!
//! Maps the `type` a field declares to the [`Renderer`] bound to it. The set of
//! kinds is fixed by [`FieldKind`]; hosts may rebind a kind to their own widget
//! but cannot invent new kinds at runtime.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{FieldsError, Result};
use crate::renderers;
use crate::types::{FieldDescriptor, FieldValue};

/// Turns a field descriptor into displayable markup.
pub trait Renderer: Send + Sync {
    /// Render the field. `value` is the currently stored value, if any.
    fn render(&self, field: &FieldDescriptor, value: Option<&FieldValue>) -> String;
}

impl<F> Renderer for F
where
    F: Fn(&FieldDescriptor, Option<&FieldValue>) -> String + Send + Sync,
{
    fn render(&self, field: &FieldDescriptor, value: Option<&FieldValue>) -> String {
        self(field, value)
    }
}

/// The field types a panel may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    TextArea,
    Wysiwyg,
    Number,
    Date,
    Checkbox,
    Select,
    Radio,
    Color,
    Hidden,
    CustomHtml,
}

impl FieldKind {
    pub const ALL: [FieldKind; 11] = [
        FieldKind::Text,
        FieldKind::TextArea,
        FieldKind::Wysiwyg,
        FieldKind::Number,
        FieldKind::Date,
        FieldKind::Checkbox,
        FieldKind::Select,
        FieldKind::Radio,
        FieldKind::Color,
        FieldKind::Hidden,
        FieldKind::CustomHtml,
    ];

    /// Canonical renderer name.
    pub fn canonical_name(self) -> &'static str {
        match self {
            FieldKind::Text => "Text",
            FieldKind::TextArea => "TextArea",
            FieldKind::Wysiwyg => "Wysiwyg",
            FieldKind::Number => "Number",
            FieldKind::Date => "Date",
            FieldKind::Checkbox => "Checkbox",
            FieldKind::Select => "Select",
            FieldKind::Radio => "Radio",
            FieldKind::Color => "Color",
            FieldKind::Hidden => "Hidden",
            FieldKind::CustomHtml => "CustomHtml",
        }
    }

    /// Short hyphenated identifier, used in CSS classes.
    pub fn slug(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::TextArea => "textarea",
            FieldKind::Wysiwyg => "wysiwyg",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
            FieldKind::Color => "color",
            FieldKind::Hidden => "hidden",
            FieldKind::CustomHtml => "custom-html",
        }
    }

    /// Find the kind a declared type identifier names.
    ///
    /// Matching is on the normalized name, ignoring case, so `text-area`,
    /// `text_area` and `textarea` are all [`FieldKind::TextArea`].
    pub fn from_identifier(identifier: &str) -> Option<FieldKind> {
        let normalized = normalize_type_name(identifier);
        if normalized.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.canonical_name().eq_ignore_ascii_case(&normalized))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Normalize a type identifier to a renderer name.
///
/// Each word segment gets an upper-case first letter and separators are
/// dropped: `text-area` becomes `TextArea`, `custom_html` becomes `CustomHtml`.
pub fn normalize_type_name(identifier: &str) -> String {
    identifier
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// A resolved renderer together with the kind it was bound under.
#[derive(Clone)]
pub struct Resolved {
    pub kind: FieldKind,
    pub renderer: Arc<dyn Renderer>,
}

impl Resolved {
    /// Canonical renderer name for the resolved kind.
    pub fn canonical_name(&self) -> &'static str {
        self.kind.canonical_name()
    }

    pub fn render(&self, field: &FieldDescriptor, value: Option<&FieldValue>) -> String {
        self.renderer.render(field, value)
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved").field("kind", &self.kind).finish()
    }
}

/// Registry of renderers, populated once at startup.
#[derive(Clone, Default)]
pub struct FieldRegistry {
    renderers: HashMap<FieldKind, Arc<dyn Renderer>>,
}

impl FieldRegistry {
    /// An empty registry. Every lookup fails until kinds are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in renderer bound for every kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in FieldKind::ALL {
            registry.register(kind, renderers::builtin(kind));
        }
        registry
    }

    /// Bind (or rebind) the renderer for a kind.
    pub fn register(&mut self, kind: FieldKind, renderer: Arc<dyn Renderer>) -> &mut Self {
        self.renderers.insert(kind, renderer);
        self
    }

    /// Whether a renderer is bound for `kind`.
    pub fn contains(&self, kind: FieldKind) -> bool {
        self.renderers.contains_key(&kind)
    }

    /// Resolve a declared type identifier to its renderer.
    pub fn resolve(&self, type_identifier: &str) -> Result<Resolved> {
        let kind = FieldKind::from_identifier(type_identifier)
            .ok_or_else(|| FieldsError::unknown_type(type_identifier))?;
        let renderer = self
            .renderers
            .get(&kind)
            .cloned()
            .ok_or_else(|| FieldsError::unknown_type(type_identifier))?;
        trace!(type_identifier, renderer = kind.canonical_name(), "resolved field renderer");
        Ok(Resolved { kind, renderer })
    }
}

impl fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.renderers.keys().map(|k| k.canonical_name()).collect();
        kinds.sort_unstable();
        f.debug_struct("FieldRegistry").field("kinds", &kinds).finish()
    }
}
