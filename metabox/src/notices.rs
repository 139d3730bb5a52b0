//! Deferred error notices.
//!
//! Messages queued while handling one request are persisted under the panel's
//! option key at request end, shown on the next render and then deleted.

use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;
use crate::store::MetaStore;

/// Messages collected during one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorQueue {
    messages: Vec<String>,
    flushed: bool,
}

impl ErrorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Persist queued messages under `key`.
    ///
    /// Writes at most once per queue and only when something was queued.
    /// Returns whether a write happened.
    pub async fn flush(&mut self, store: &dyn MetaStore, key: &str) -> Result<bool> {
        if self.flushed || self.messages.is_empty() {
            return Ok(false);
        }
        store
            .set_option(key, Value::from(self.messages.clone()))
            .await?;
        self.flushed = true;
        info!(key, count = self.messages.len(), "error notices persisted");
        Ok(true)
    }
}

/// Read the persisted messages under `key` without removing them.
pub async fn stored(store: &dyn MetaStore, key: &str) -> Result<Vec<String>> {
    Ok(store
        .get_option(key)
        .await?
        .map(|value| decode(key, value))
        .unwrap_or_default())
}

/// Read the persisted messages under `key` and delete the option.
///
/// A value of the wrong shape is dropped with a warning; the option is still
/// deleted so it cannot resurface.
pub async fn take_stored(store: &dyn MetaStore, key: &str) -> Result<Vec<String>> {
    let Some(value) = store.get_option(key).await? else {
        return Ok(Vec::new());
    };
    let messages = decode(key, value);
    store.delete_option(key).await?;
    Ok(messages)
}

fn decode(key: &str, value: Value) -> Vec<String> {
    match serde_json::from_value::<Vec<String>>(value) {
        Ok(messages) => messages,
        Err(e) => {
            warn!(key, error = %e, "discarding malformed error notices");
            Vec::new()
        }
    }
}
