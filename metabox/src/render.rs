//! Schema processing for the render path.
//!
//! [`process`] walks the schema once and returns an immutable [`RenderState`]:
//! one navigation entry and one content block per tab, each content block
//! holding the markup of its fields. Nothing is cached between renders.

use std::collections::HashMap;
use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};
use metabox_fields::{FieldRegistry, FieldSchema, FieldValue};
use tracing::trace;

/// CSS class marking the initially visible tab
pub const ACTIVE_CLASS: &str = "mb-active";

/// Current stored values keyed by field id.
pub type FieldValues = HashMap<String, FieldValue>;

/// Composite id shared by a tab's navigation entry and its content block.
pub fn tab_id(panel_id: &str, index: usize) -> String {
    format!("{panel_id}-tab-{index}")
}

/// One item of the tab switcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub tab_id: String,
    pub title: String,
    pub active: bool,
}

impl NavEntry {
    pub fn to_html(&self) -> String {
        format!(
            r#"<li class="mb-nav-item tab-link{}" data-tab="{}"><span class="mb-nav-link">{}</span></li>"#,
            active_suffix(self.active),
            encode_double_quoted_attribute(&self.tab_id),
            encode_text(&self.title),
        )
    }
}

/// One tab's worth of field markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub tab_id: String,
    pub active: bool,
    pub fields: Vec<String>,
}

impl ContentBlock {
    pub fn to_html(&self) -> String {
        let mut out = format!(
            r#"<div id="{}" class="tab-content{}"><ul>"#,
            encode_double_quoted_attribute(&self.tab_id),
            active_suffix(self.active),
        );
        for field in &self.fields {
            out.push_str(field);
        }
        out.push_str("</ul></div>");
        out
    }
}

fn active_suffix(active: bool) -> String {
    if active {
        format!(" {ACTIVE_CLASS}")
    } else {
        String::new()
    }
}

/// Result of processing a schema for one render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderState {
    pub navigation: Vec<NavEntry>,
    pub content: Vec<ContentBlock>,
    pub tab_count: usize,
}

impl RenderState {
    /// Tab navigation is only worth showing with more than one tab.
    pub fn shows_navigation(&self) -> bool {
        self.tab_count > 1
    }

    pub fn navigation_html(&self) -> String {
        self.navigation.iter().map(NavEntry::to_html).collect()
    }

    pub fn content_html(&self) -> String {
        self.content.iter().map(ContentBlock::to_html).collect()
    }
}

/// Build the navigation and content for `schema`.
///
/// Tabs are numbered from 1 and only the first is active. Each field is drawn
/// by the renderer its `type` resolves to; an unresolvable type aborts the
/// render with [`FieldsError::UnknownFieldType`](metabox_fields::FieldsError).
pub fn process(
    panel_id: &str,
    schema: &FieldSchema,
    registry: &FieldRegistry,
    values: &FieldValues,
) -> metabox_fields::Result<RenderState> {
    let mut state = RenderState {
        tab_count: schema.len(),
        ..RenderState::default()
    };

    for (offset, tab) in schema.tabs().iter().enumerate() {
        let index = offset + 1;
        let active = index == 1;
        let id = tab_id(panel_id, index);

        state.navigation.push(NavEntry {
            tab_id: id.clone(),
            title: tab.title.clone(),
            active,
        });

        let mut fields = Vec::with_capacity(tab.fields.len());
        for field in &tab.fields {
            let resolved = registry.resolve(&field.type_)?;
            let value = field.persist_key().and_then(|key| values.get(key));
            fields.push(resolved.render(field, value));
        }
        trace!(panel = panel_id, tab = index, fields = fields.len(), "tab processed");

        state.content.push(ContentBlock {
            tab_id: id,
            active,
            fields,
        });
    }

    Ok(state)
}

/// Wrap messages for the host's notice area. Messages are plain text.
pub fn notices_html(messages: &[String]) -> String {
    let mut out = String::new();
    for message in messages {
        let _ = write!(
            out,
            r#"<div class="error mb-notice"><p>{}</p></div>"#,
            encode_text(message)
        );
    }
    out
}
