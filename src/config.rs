//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/taxotree/taxotree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `TAXOTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Page size of a single children query.
pub const DEFAULT_PAGE_SIZE: usize = 150;

/// Analytics event settings for the facet adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Emit events at all
    pub enabled: bool,
    /// Event category
    pub category: String,
    /// Prepended to the node text to form the event label
    pub label_prefix: String,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            category: "tree".into(),
            label_prefix: "Discover - ".into(),
        }
    }
}

/// Raw analytics settings for intermediate parsing (None = not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawAnalyticsSettings {
    pub enabled: Option<bool>,
    pub category: Option<String>,
    pub label_prefix: Option<String>,
}

impl AnalyticsSettings {
    fn merge(&self, overlay: &RawAnalyticsSettings) -> Self {
        Self {
            enabled: overlay.enabled.unwrap_or(self.enabled),
            category: overlay
                .category
                .clone()
                .unwrap_or_else(|| self.category.clone()),
            label_prefix: overlay
                .label_prefix
                .clone()
                .unwrap_or_else(|| self.label_prefix.clone()),
        }
    }
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub page_size: Option<usize>,
    pub default_expand_limit: Option<usize>,
    pub cascade_child_limit: Option<usize>,
    pub expand_selected: Option<bool>,
    #[serde(default)]
    pub analytics: RawAnalyticsSettings,
}

/// Unified configuration for taxotree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of children fetched per node (default: 150)
    pub page_size: usize,
    /// Auto-expand every top-level node when there are at most this many
    /// and no filter is active (default: 3)
    pub default_expand_limit: usize,
    /// Cascade one level into an auto-expanded node with at most this many
    /// children (default: 3)
    pub cascade_child_limit: usize,
    /// Also open the node named by a filter, not only its ancestors
    pub expand_selected: bool,
    pub analytics: AnalyticsSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            default_expand_limit: 3,
            cascade_child_limit: 3,
            expand_selected: false,
            analytics: AnalyticsSettings::default(),
        }
    }
}

/// Get the XDG config directory for taxotree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "taxotree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("taxotree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Unset keys are `None`; a value that does not parse is an error.
fn env_value<T: DeserializeOwned>(
    config: &Config,
    key: &str,
) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

impl Settings {
    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            page_size: overlay.page_size.unwrap_or(self.page_size),
            default_expand_limit: overlay
                .default_expand_limit
                .unwrap_or(self.default_expand_limit),
            cascade_child_limit: overlay
                .cascade_child_limit
                .unwrap_or(self.cascade_child_limit),
            expand_selected: overlay.expand_selected.unwrap_or(self.expand_selected),
            analytics: self.analytics.merge(&overlay.analytics),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; it must exist
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Load from a single file on top of the defaults, ignoring global config
    /// and environment.
    pub fn from_file(path: &Path) -> Result<Self, ApplicationError> {
        let settings = Self::default().merge_with(&load_raw_settings(path)?);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply TAXOTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TAXOTREE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<usize>(&config, "page_size")? {
            settings.page_size = val;
        }
        if let Some(val) = env_value::<usize>(&config, "default_expand_limit")? {
            settings.default_expand_limit = val;
        }
        if let Some(val) = env_value::<usize>(&config, "cascade_child_limit")? {
            settings.cascade_child_limit = val;
        }
        if let Some(val) = env_value::<bool>(&config, "expand_selected")? {
            settings.expand_selected = val;
        }
        if let Some(val) = env_value::<bool>(&config, "analytics.enabled")? {
            settings.analytics.enabled = val;
        }
        if let Some(val) = env_value::<String>(&config, "analytics.category")? {
            settings.analytics.category = val;
        }
        if let Some(val) = env_value::<String>(&config, "analytics.label_prefix")? {
            settings.analytics.label_prefix = val;
        }

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.page_size == 0 {
            return Err(ApplicationError::Config {
                message: "page_size must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Render as TOML (for `config show`).
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}
