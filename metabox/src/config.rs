//! Panel configuration using Figment
//!
//! A [`PanelConfig`] can be built in code or loaded from layered sources, later
//! sources overriding earlier ones:
//!
//! 1. Default values (hardcoded)
//! 2. An optional configuration file (TOML, YAML or JSON by extension)
//! 3. Environment variables with the `METABOX_` prefix

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, trace};

use crate::error::{MetaboxError, Result};

/// Default environment variable prefix
pub const ENV_PREFIX: &str = "METABOX_";

/// Default capability checked before showing or saving a panel
pub const DEFAULT_CAPABILITY: &str = "edit_post";

/// Default meta key prefix
pub const DEFAULT_PREFIX: &str = "_mb_";

/// Where on the editing screen the panel is placed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoxContext {
    #[default]
    Normal,
    Side,
    Advanced,
}

/// Placement priority within the context.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoxPriority {
    #[default]
    Default,
    High,
    Low,
}

/// Accept a single screen, a comma-separated list, or a sequence.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        OneOrMany::Many(v) => v,
    })
}

/// Identity and placement of one panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelConfig {
    /// Unique panel id; also namespaces tab ids and the error option key
    pub id: String,
    pub title: String,
    /// Post types the panel is attached to
    #[serde(default, deserialize_with = "one_or_many")]
    pub screens: Vec<String>,
    #[serde(default = "default_capability")]
    pub capability: String,
    #[serde(default)]
    pub context: BoxContext,
    #[serde(default)]
    pub priority: BoxPriority,
    /// Prefix for the meta keys of this panel's fields. Field ids are taken
    /// as given; panels build them with [`PanelConfig::meta_key`].
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_capability() -> String {
    DEFAULT_CAPABILITY.to_string()
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            screens: Vec::new(),
            capability: default_capability(),
            context: BoxContext::default(),
            priority: BoxPriority::default(),
            prefix: default_prefix(),
        }
    }
}

impl PanelConfig {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_screen(mut self, screen: impl Into<String>) -> Self {
        self.screens.push(screen.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = capability.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Option key under which queued error messages are persisted.
    pub fn error_key(&self) -> String {
        format!("metabox_errors_{}", self.id)
    }

    /// A field meta key with this panel's prefix applied. Use it when
    /// declaring field ids so stored keys follow the configured prefix.
    pub fn meta_key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Whether the panel is attached to `screen`.
    pub fn handles_screen(&self, screen: &str) -> bool {
        self.screens.iter().any(|s| s == screen)
    }

    /// Reject configurations a panel cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(MetaboxError::invalid_config("id", "must not be empty"));
        }
        if self.id.chars().any(char::is_whitespace) {
            return Err(MetaboxError::invalid_config("id", "must not contain whitespace"));
        }
        if self.screens.is_empty() {
            return Err(MetaboxError::invalid_config(
                "screens",
                "at least one screen is required",
            ));
        }
        if self.capability.trim().is_empty() {
            return Err(MetaboxError::invalid_config("capability", "must not be empty"));
        }
        Ok(())
    }
}

/// Loads a [`PanelConfig`] from defaults, an optional file and the environment.
pub struct PanelConfigLoader {
    defaults: PanelConfig,
    file: Option<PathBuf>,
    env_prefix: String,
}

impl PanelConfigLoader {
    pub fn new() -> Self {
        Self {
            defaults: PanelConfig::default(),
            file: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Values used when no other source provides them.
    pub fn with_defaults(mut self, defaults: PanelConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Configuration file; format is chosen by extension.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Merge all sources, extract and validate.
    pub fn load(&self) -> Result<PanelConfig> {
        let figment = self.build_figment()?;
        let config: PanelConfig = figment.extract()?;
        config.validate()?;
        debug!(panel = %config.id, screens = ?config.screens, "panel configuration loaded");
        Ok(config)
    }

    fn build_figment(&self) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(&self.defaults));

        if let Some(path) = &self.file {
            trace!("Loading panel config file: {}", path.display());
            figment = figment.merge(file_provider(path)?);
        }

        Ok(figment.merge(Env::prefixed(&self.env_prefix)))
    }
}

impl Default for PanelConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn file_provider(path: &Path) -> Result<Figment> {
    if !path.exists() {
        return Err(MetaboxError::Config {
            message: format!("configuration file not found: {}", path.display()),
        });
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(Figment::from(Toml::file(path))),
        Some("yaml") | Some("yml") => Ok(Figment::from(Yaml::file(path))),
        Some("json") => Ok(Figment::from(Json::file(path))),
        other => Err(MetaboxError::invalid_config(
            "file",
            format!("unsupported configuration format: {}", other.unwrap_or("<none>")),
        )),
    }
}
