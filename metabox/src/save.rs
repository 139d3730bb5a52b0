//! Persistence pipeline for the save path.
//!
//! [`save`] runs a fixed sequence of gates (authorization, request context,
//! schema) and then walks every field with an id, sanitizing and storing each
//! one independently. A failed write never stops the walk.

use metabox_fields::{sanitize, FieldDescriptor, FieldSchema, SanitizeFlags};
use tracing::{debug, warn};

use crate::auth::{Authorizer, NonceProvider};
use crate::config::PanelConfig;
use crate::store::{MetaStore, PostId};
use crate::submission::{Request, Submission, NONCE_ACTION};

/// Why a save was short-circuited without touching any field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Inline quick-edit carries only a subset of fields
    InlineSave,
    /// Background/async partial save
    Ajax,
    /// The panel has no usable schema
    NoSchema,
}

/// Counts from one field walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Fields with an id that were sanitized and sent to the store
    pub attempted: usize,
    /// Writes the store reported as changing something
    pub written: usize,
    /// Writes the store rejected with an error
    pub failed: usize,
}

impl SaveReport {
    /// Writes that succeeded without changing the stored value.
    pub fn unchanged(&self) -> usize {
        self.attempted
            .saturating_sub(self.written)
            .saturating_sub(self.failed)
    }
}

/// Outcome of [`save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Missing/invalid token or missing capability. Nothing was written.
    Unauthorized,
    /// Deliberately not saved. Callers treat this like success.
    Skipped(SkipReason),
    /// The field walk ran to the end, possibly with individual failures.
    Applied(SaveReport),
}

impl SaveResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, SaveResult::Applied(_))
    }
}

/// The host collaborators a save needs.
#[derive(Clone, Copy)]
pub struct SaveServices<'a> {
    pub store: &'a dyn MetaStore,
    pub authorizer: &'a dyn Authorizer,
    pub nonces: &'a dyn NonceProvider,
}

enum FieldWrite {
    Written,
    Unchanged,
    Failed,
}

/// Run the save gates and, if they pass, persist every field with an id.
///
/// `schema` is `None` when the panel could not produce a usable schema.
pub async fn save(
    config: &PanelConfig,
    post_id: PostId,
    schema: Option<&FieldSchema>,
    request: &Request,
    services: SaveServices<'_>,
) -> SaveResult {
    let token_ok = request
        .nonce()
        .is_some_and(|token| services.nonces.verify(token, NONCE_ACTION));
    if !token_ok
        || !services
            .authorizer
            .can(&request.principal, &config.capability, post_id)
    {
        debug!(panel = %config.id, %post_id, "save refused");
        return SaveResult::Unauthorized;
    }

    if request.is_inline_save() {
        return SaveResult::Skipped(SkipReason::InlineSave);
    }
    if request.is_ajax {
        return SaveResult::Skipped(SkipReason::Ajax);
    }

    let Some(schema) = schema else {
        return SaveResult::Skipped(SkipReason::NoSchema);
    };

    let mut report = SaveReport::default();
    for field in schema.persistable_fields() {
        report.attempted += 1;
        match write_field(services.store, post_id, field, &request.submission).await {
            FieldWrite::Written => report.written += 1,
            FieldWrite::Unchanged => {}
            FieldWrite::Failed => report.failed += 1,
        }
    }

    debug!(
        panel = %config.id,
        %post_id,
        attempted = report.attempted,
        written = report.written,
        failed = report.failed,
        "fields saved"
    );
    SaveResult::Applied(report)
}

/// Sanitize and store one field.
///
/// Returns whether the store reported a write. An unchanged value reports
/// `false`, as does a store error (which is logged, not raised). Fields without
/// an id are never stored.
pub async fn save_field(
    store: &dyn MetaStore,
    post_id: PostId,
    field: &FieldDescriptor,
    submission: &Submission,
) -> bool {
    matches!(
        write_field(store, post_id, field, submission).await,
        FieldWrite::Written
    )
}

async fn write_field(
    store: &dyn MetaStore,
    post_id: PostId,
    field: &FieldDescriptor,
    submission: &Submission,
) -> FieldWrite {
    let Some(key) = field.persist_key() else {
        return FieldWrite::Unchanged;
    };
    let flags = SanitizeFlags::for_field(field);
    let value = sanitize(submission.get(key, flags.require_array), field);

    match store.set_meta(post_id, key, value).await {
        Ok(true) => FieldWrite::Written,
        Ok(false) => FieldWrite::Unchanged,
        Err(e) => {
            warn!(%post_id, field = key, error = %e, "field store failed");
            FieldWrite::Failed
        }
    }
}
