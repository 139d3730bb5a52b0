//! Panel lifecycle
//!
//! A [`Panel`] pairs a [`PanelConfig`] with a host-defined [`Metabox`] and
//! drives it through one request: registration on the editing screen, the
//! guarded save with its before/after hooks, flushing queued errors at request
//! end, and rendering (panel markup and the deferred notices).

use std::sync::Arc;

use async_trait::async_trait;
use html_escape::{encode_double_quoted_attribute, encode_text};
use metabox_fields::{FieldRegistry, FieldSchema};
use tracing::{debug, info, warn};

use crate::auth::{Authorizer, NonceProvider, Principal};
use crate::config::{BoxContext, BoxPriority, PanelConfig};
use crate::error::Result;
use crate::notices::{self, ErrorQueue};
use crate::render::{self, FieldValues};
use crate::save::{self, SaveResult, SaveServices};
use crate::store::{MetaStore, PostId};
use crate::submission::{Request, NONCE_ACTION, NONCE_FIELD};

/// What the save hooks get to work with.
pub struct SaveContext<'a> {
    pub post_id: PostId,
    pub request: &'a Request,
    pub store: &'a dyn MetaStore,
    pub errors: &'a mut ErrorQueue,
    /// `None` in `before_save`; the pipeline's result in `after_save`
    pub outcome: Option<SaveResult>,
}

impl SaveContext<'_> {
    /// Queue a message for the next render.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.add(message);
    }
}

/// A concrete panel: its schema and optional extension points.
#[async_trait]
pub trait Metabox: Send + Sync {
    /// The tabbed field schema.
    fn fields(&self) -> Result<FieldSchema>;

    /// Rewrite the schema before rendering. Saving always uses [`Metabox::fields`].
    fn filter_fields(&self, schema: FieldSchema) -> FieldSchema {
        schema
    }

    async fn before_save(&self, _ctx: &mut SaveContext<'_>) -> Result<()> {
        Ok(())
    }

    async fn after_save(&self, _ctx: &mut SaveContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Markup placed before the tab content.
    fn before_content(&self, _panel_id: &str) -> String {
        String::new()
    }

    /// Markup placed after the tab content.
    fn after_content(&self, _panel_id: &str) -> String {
        String::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Registered,
    SaveInvoked,
    SaveComplete,
}

/// What the host needs to place the panel on the editing screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub id: String,
    pub title: String,
    pub screens: Vec<String>,
    pub context: BoxContext,
    pub priority: BoxPriority,
}

pub struct Panel<M> {
    config: PanelConfig,
    metabox: M,
    registry: Arc<FieldRegistry>,
    state: LifecycleState,
    save_result: Option<SaveResult>,
    errors: ErrorQueue,
}

impl<M: Metabox> Panel<M> {
    /// Build a panel with the built-in field renderers.
    pub fn new(config: PanelConfig, metabox: M) -> Result<Self> {
        Self::with_registry(config, metabox, Arc::new(FieldRegistry::with_defaults()))
    }

    /// Build a panel sharing a host-supplied registry.
    pub fn with_registry(
        config: PanelConfig,
        metabox: M,
        registry: Arc<FieldRegistry>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metabox,
            registry,
            state: LifecycleState::Idle,
            save_result: None,
            errors: ErrorQueue::new(),
        })
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn metabox(&self) -> &M {
        &self.metabox
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether saves for `screen` should be routed to this panel.
    pub fn handles_screen(&self, screen: &str) -> bool {
        self.config.handles_screen(screen)
    }

    /// Register on the editing screen for `post_id`.
    ///
    /// Returns `None` when the principal lacks the panel capability.
    pub fn on_register(
        &mut self,
        principal: &Principal,
        post_id: PostId,
        authorizer: &dyn Authorizer,
    ) -> Option<Registration> {
        if !authorizer.can(principal, &self.config.capability, post_id) {
            debug!(panel = %self.config.id, %post_id, "panel not registered");
            return None;
        }
        if self.state == LifecycleState::Idle {
            self.state = LifecycleState::Registered;
        }
        Some(Registration {
            id: self.config.id.clone(),
            title: self.config.title.clone(),
            screens: self.config.screens.clone(),
            context: self.config.context,
            priority: self.config.priority,
        })
    }

    /// Save handler for the host's post-save event.
    ///
    /// Runs at most once per request: later calls return the first result
    /// without touching the store. Hook errors are logged but not queued
    /// as notices; they never abort the save.
    pub async fn on_save(
        &mut self,
        post_id: PostId,
        request: &Request,
        services: SaveServices<'_>,
    ) -> SaveResult {
        if let Some(result) = self.save_result {
            debug!(panel = %self.config.id, %post_id, "save already ran for this request");
            return result;
        }
        self.state = LifecycleState::SaveInvoked;

        let mut ctx = SaveContext {
            post_id,
            request,
            store: services.store,
            errors: &mut self.errors,
            outcome: None,
        };
        let hook = self.metabox.before_save(&mut ctx).await;
        if let Err(e) = hook {
            warn!(panel = %self.config.id, %post_id, error = %e, "before_save hook failed");
        }

        let schema = match self.metabox.fields() {
            Ok(schema) => Some(schema),
            Err(e) => {
                warn!(panel = %self.config.id, error = %e, "schema unavailable, skipping save");
                None
            }
        };
        let result = save::save(&self.config, post_id, schema.as_ref(), request, services).await;

        ctx.outcome = Some(result);
        let hook = self.metabox.after_save(&mut ctx).await;
        if let Err(e) = hook {
            warn!(panel = %self.config.id, %post_id, error = %e, "after_save hook failed");
        }

        self.save_result = Some(result);
        self.state = LifecycleState::SaveComplete;
        result
    }

    /// The result of this request's save, if it ran.
    pub fn save_result(&self) -> Option<SaveResult> {
        self.save_result
    }

    /// Persist queued errors. Call once when the request ends.
    pub async fn on_request_end(&mut self, store: &dyn MetaStore) -> Result<bool> {
        let key = self.config.error_key();
        self.errors.flush(store, &key).await
    }

    /// Start a new request on a long-lived instance.
    pub fn reset_request(&mut self) {
        self.save_result = None;
        self.errors = ErrorQueue::new();
        if self.state != LifecycleState::Idle {
            self.state = LifecycleState::Registered;
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.add(message);
    }

    /// In-memory messages queued during this request.
    pub fn errors(&self) -> &ErrorQueue {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Persisted messages waiting to be displayed, left in place.
    pub async fn stored_errors(&self, store: &dyn MetaStore) -> Result<Vec<String>> {
        notices::stored(store, &self.config.error_key()).await
    }

    /// Notice markup for persisted messages, deleting them once read.
    pub async fn render_notices(&self, store: &dyn MetaStore) -> Result<String> {
        let messages = notices::take_stored(store, &self.config.error_key()).await?;
        if messages.is_empty() {
            return Ok(String::new());
        }
        info!(panel = %self.config.id, count = messages.len(), "error notices displayed");
        Ok(render::notices_html(&messages))
    }

    /// Full panel markup for `post_id`.
    pub async fn render(
        &self,
        post_id: PostId,
        store: &dyn MetaStore,
        nonces: &dyn NonceProvider,
    ) -> Result<String> {
        let schema = self.metabox.filter_fields(self.metabox.fields()?);

        let mut values = FieldValues::new();
        for field in schema.persistable_fields() {
            if let Some(key) = field.persist_key() {
                if let Some(value) = store.get_meta(post_id, key).await? {
                    values.insert(key.to_string(), value);
                }
            }
        }

        let state = render::process(&self.config.id, &schema, &self.registry, &values)?;
        debug!(panel = %self.config.id, %post_id, tabs = state.tab_count, "panel rendered");

        let id = &self.config.id;
        let mut out = format!(
            r#"<div class="mb-container" id="{}">"#,
            encode_double_quoted_attribute(id)
        );
        if state.shows_navigation() {
            out.push_str(r#"<nav class="mb-nav-tab-wrapper"><ul class="tabs mb-nav-items">"#);
            out.push_str(&state.navigation_html());
            out.push_str("</ul></nav>");
        }
        out.push_str(&self.metabox.before_content(id));
        out.push_str(&state.content_html());
        out.push_str(&self.metabox.after_content(id));
        out.push_str("</div>");
        out.push_str(&format!(
            r#"<input type="hidden" name="{NONCE_FIELD}" value="{}">"#,
            encode_double_quoted_attribute(&nonces.issue(NONCE_ACTION))
        ));
        Ok(out)
    }

    /// Title as it should appear in the panel header.
    pub fn title_html(&self) -> String {
        encode_text(&self.config.title).into_owned()
    }
}
