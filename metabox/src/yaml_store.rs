//! YAML-on-disk store.
//!
//! Layout under the root directory:
//! ```text
//! posts/
//!   <post_id>.yaml   ← mapping of meta key to value
//! options.yaml       ← mapping of option key to value
//! ```
//! Every write goes to a temp file which is then renamed over the target.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use metabox_fields::FieldValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use ulid::Ulid;

use crate::error::{MetaboxError, Result};
use crate::store::{MetaStore, PostId};

type PostMeta = BTreeMap<String, FieldValue>;
type Options = BTreeMap<String, serde_json::Value>;

/// File-backed [`MetaStore`].
pub struct YamlStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl YamlStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("posts")).await?;
        debug!(root = %root.display(), "yaml store opened");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// The root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn post_path(&self, post_id: PostId) -> PathBuf {
        self.root.join("posts").join(format!("{post_id}.yaml"))
    }

    fn options_path(&self) -> PathBuf {
        self.root.join("options.yaml")
    }
}

async fn read_map<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_yaml_ng::from_str(&content)?)
}

async fn write_map<T: Serialize>(path: &Path, map: &T) -> Result<()> {
    let yaml = serde_yaml_ng::to_string(map)?;
    atomic_write(path, yaml.as_bytes()).await
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| MetaboxError::store(format!("no parent dir for {}", path.display())))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl MetaStore for YamlStore {
    async fn get_meta(&self, post_id: PostId, key: &str) -> Result<Option<FieldValue>> {
        let meta: PostMeta = read_map(&self.post_path(post_id)).await?;
        Ok(meta.get(key).cloned())
    }

    async fn set_meta(&self, post_id: PostId, key: &str, value: FieldValue) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let path = self.post_path(post_id);
        let mut meta: PostMeta = read_map(&path).await?;
        if meta.get(key) == Some(&value) {
            return Ok(false);
        }
        meta.insert(key.to_string(), value);
        write_map(&path, &meta).await?;
        Ok(true)
    }

    async fn get_option(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let options: Options = read_map(&self.options_path()).await?;
        Ok(options.get(key).cloned())
    }

    async fn set_option(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.options_path();
        let mut options: Options = read_map(&path).await?;
        options.insert(key.to_string(), value);
        write_map(&path, &options).await
    }

    async fn delete_option(&self, key: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let path = self.options_path();
        let mut options: Options = read_map(&path).await?;
        if options.remove(key).is_none() {
            return Ok(false);
        }
        write_map(&path, &options).await?;
        Ok(true)
    }
}
