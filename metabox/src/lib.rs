//! Tabbed settings panels for content-editing screens
//!
//! A panel declares a two-level schema (tabs holding fields). On render the
//! schema becomes tab navigation plus per-tab field markup; on submit every
//! field with an id is sanitized and stored, and any messages queued along the
//! way are shown once on the next render.
//!
//! Host concerns are traits: [`MetaStore`] for persistence, [`Authorizer`] for
//! capability checks, [`NonceProvider`] for anti-forgery tokens. A concrete
//! panel implements [`Metabox`] and is driven by [`Panel`].
//!
//! ```no_run
//! use metabox::{
//!     CapabilityAuthorizer, FieldDescriptor, FieldSchema, Metabox, MemoryStore,
//!     NonceProvider, Panel, PanelConfig, PostId, Principal, Request, Result,
//!     SaveServices, Submission, Tab,
//! };
//!
//! struct Course;
//!
//! impl Metabox for Course {
//!     fn fields(&self) -> Result<FieldSchema> {
//!         Ok(vec![Tab::new(
//!             "General",
//!             vec![FieldDescriptor::new("text").with_id("_mb_length")],
//!         )]
//!         .into())
//!     }
//! }
//!
//! struct Nonces;
//!
//! impl NonceProvider for Nonces {
//!     fn issue(&self, _action: &str) -> String {
//!         "token".into()
//!     }
//!     fn verify(&self, token: &str, _action: &str) -> bool {
//!         token == "token"
//!     }
//! }
//!
//! # async fn run() -> Result<()> {
//! let store = MemoryStore::new();
//! let mut panel = Panel::new(PanelConfig::new("course", "Course").with_screen("course"), Course)?;
//!
//! let request = Request::new(
//!     Principal::new(1).with_capability("edit_post"),
//!     Submission::from_urlencoded("metabox_nonce=token&_mb_length=3+weeks"),
//! );
//! let services = SaveServices {
//!     store: &store,
//!     authorizer: &CapabilityAuthorizer,
//!     nonces: &Nonces,
//! };
//! panel.on_save(PostId(7), &request, services).await;
//! panel.on_request_end(&store).await?;
//!
//! let _html = panel.render(PostId(7), &store, &Nonces).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod notices;
pub mod panel;
pub mod render;
pub mod save;
pub mod store;
pub mod submission;
pub mod yaml_store;

pub use auth::{Authorizer, CapabilityAuthorizer, NonceProvider, Principal};
pub use config::{BoxContext, BoxPriority, PanelConfig, PanelConfigLoader};
pub use error::{MetaboxError, Result};
pub use notices::ErrorQueue;
pub use panel::{LifecycleState, Metabox, Panel, Registration, SaveContext};
pub use render::{process, ContentBlock, NavEntry, RenderState};
pub use save::{save, save_field, SaveReport, SaveResult, SaveServices, SkipReason};
pub use store::{MemoryStore, MetaStore, PostId};
pub use submission::{Request, Submission};
pub use yaml_store::YamlStore;

pub use metabox_fields::{
    FieldDescriptor, FieldKind, FieldRegistry, FieldSchema, FieldValue, FieldsError, RawInput,
    Renderer, SanitizeMode, Tab,
};
