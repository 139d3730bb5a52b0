//! Durable key/value storage abstraction
//!
//! Panels persist one entry per `(post, field)` and one option per panel for
//! queued error messages. Storage is a collaborator: hosts plug in their own
//! backend by implementing [`MetaStore`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use metabox_fields::FieldValue;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::Result;

/// Identifier of the content item a panel is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PostId {
    fn from(id: u64) -> Self {
        PostId(id)
    }
}

/// Storage abstraction for post meta and site options
#[async_trait]
pub trait MetaStore: Send + Sync {
    /// Read the value stored for a post under `key`
    async fn get_meta(&self, post_id: PostId, key: &str) -> Result<Option<FieldValue>>;

    /// Store a value for a post.
    ///
    /// Returns `false` when nothing changed (the stored value was identical).
    async fn set_meta(&self, post_id: PostId, key: &str, value: FieldValue) -> Result<bool>;

    /// Read an option
    async fn get_option(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Create or replace an option
    async fn set_option(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Delete an option; returns whether it existed
    async fn delete_option(&self, key: &str) -> Result<bool>;
}

/// In-process store, useful for tests and single-process hosts.
#[derive(Default)]
pub struct MemoryStore {
    meta: Mutex<HashMap<(PostId, String), FieldValue>>,
    options: Mutex<HashMap<String, serde_json::Value>>,
    set_meta_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set_meta` calls received, whether or not they changed anything.
    pub fn set_meta_calls(&self) -> usize {
        self.set_meta_calls.load(Ordering::SeqCst)
    }

    /// All meta stored for a post.
    pub async fn meta_for(&self, post_id: PostId) -> HashMap<String, FieldValue> {
        self.meta
            .lock()
            .await
            .iter()
            .filter(|((post, _), _)| *post == post_id)
            .map(|((_, key), value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[async_trait]
impl MetaStore for MemoryStore {
    async fn get_meta(&self, post_id: PostId, key: &str) -> Result<Option<FieldValue>> {
        Ok(self.meta.lock().await.get(&(post_id, key.to_string())).cloned())
    }

    async fn set_meta(&self, post_id: PostId, key: &str, value: FieldValue) -> Result<bool> {
        self.set_meta_calls.fetch_add(1, Ordering::SeqCst);
        let mut meta = self.meta.lock().await;
        let slot = (post_id, key.to_string());
        if meta.get(&slot) == Some(&value) {
            return Ok(false);
        }
        meta.insert(slot, value);
        Ok(true)
    }

    async fn get_option(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.options.lock().await.get(key).cloned())
    }

    async fn set_option(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.options.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete_option(&self, key: &str) -> Result<bool> {
        Ok(self.options.lock().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_meta_reports_unchanged_writes() {
        let store = MemoryStore::new();
        let post = PostId(7);

        assert!(store.set_meta(post, "_mb_title", "Hello".into()).await.unwrap());
        assert!(!store.set_meta(post, "_mb_title", "Hello".into()).await.unwrap());
        assert!(store.set_meta(post, "_mb_title", "World".into()).await.unwrap());

        assert_eq!(store.set_meta_calls(), 3);
        assert_eq!(
            store.get_meta(post, "_mb_title").await.unwrap(),
            Some(FieldValue::from("World"))
        );
        assert_eq!(store.get_meta(PostId(8), "_mb_title").await.unwrap(), None);
    }

    #[tokio::test]
    async fn options_round_trip_and_delete() {
        let store = MemoryStore::new();
        store.set_option("k", json!(["A", "B"])).await.unwrap();
        assert_eq!(store.get_option("k").await.unwrap(), Some(json!(["A", "B"])));
        assert!(store.delete_option("k").await.unwrap());
        assert!(!store.delete_option("k").await.unwrap());
        assert_eq!(store.get_option("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn meta_for_filters_by_post() {
        let store = MemoryStore::new();
        store.set_meta(PostId(1), "a", "1".into()).await.unwrap();
        store.set_meta(PostId(2), "a", "2".into()).await.unwrap();
        let meta = store.meta_for(PostId(1)).await;
        assert_eq!(meta.len(), 1);
        assert_eq!(meta["a"], FieldValue::from("1"));
    }
}
