//! Field schema, renderer registry and sanitization policy
//!
//! `metabox-fields` is a schema-only crate. It knows how a panel's fields are
//! declared, which renderer draws each field type, and how submitted input is
//! cleaned before storage. It knows nothing about requests, principals or
//! storage backends; the `metabox` crate wires those in.
//!
//! # Architecture
//!
//! - **Two-level schema**: a [`FieldSchema`] is an ordered list of [`Tab`]s,
//!   each an ordered list of [`FieldDescriptor`]s
//! - **Explicit registry**: field types resolve through [`FieldRegistry`] to a
//!   fixed set of [`FieldKind`]s; unknown types are an error, never skipped
//! - **Pure sanitization**: [`sanitize`] maps raw input plus a descriptor to a
//!   storable [`FieldValue`] without side effects
//! - **YAML on disk**: schemas can be declared in code or loaded from YAML

pub mod error;
pub mod registry;
pub mod renderers;
pub mod sanitize;
pub mod types;

pub use error::{FieldsError, Result};
pub use registry::{normalize_type_name, FieldKind, FieldRegistry, Renderer, Resolved};
pub use sanitize::{clean_text, sanitize, RawInput, SanitizeFlags};
pub use types::{FieldDescriptor, FieldSchema, FieldValue, SanitizeMode, SelectOption, Tab};
