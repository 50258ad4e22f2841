//! Module configuration loaded from `seo-robots.toml`.

use crate::core::error::RobotsError;
use crate::core::resolve::{DEFAULT_STORE_ID, StoreId};
use crate::core::validate::{DEFAULT_BOTS, KnownBots};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "seo-robots.toml";
/// Overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "SEO_ROBOTS_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RobotsConfig {
    /// When false every lookup answers "no directive".
    pub enabled: bool,
    pub store_id: StoreId,
    pub allowed_bots: Vec<String>,
    /// Meta content used when resolution finds nothing.
    pub default_meta: Option<String>,
    /// Header value used when resolution finds nothing.
    pub default_header: Option<String>,
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store_id: DEFAULT_STORE_ID,
            allowed_bots: DEFAULT_BOTS.iter().map(|b| b.to_string()).collect(),
            default_meta: Some("INDEX, FOLLOW".to_string()),
            default_header: None,
        }
    }
}

impl RobotsConfig {
    pub fn known_bots(&self) -> KnownBots {
        KnownBots::new(&self.allowed_bots)
    }

    pub fn parse(content: &str) -> Result<Self, RobotsError> {
        Ok(toml::from_str(content)?)
    }
}

/// Config path: `$SEO_ROBOTS_CONFIG` when set, else `seo-robots.toml` in `dir`.
pub fn config_path(dir: &Path) -> PathBuf {
    match env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => dir.join(CONFIG_FILE_NAME),
    }
}

/// A missing file yields the defaults; a malformed one is an error.
pub fn load_config(path: &Path) -> Result<RobotsConfig, RobotsError> {
    if !path.exists() {
        return Ok(RobotsConfig::default());
    }
    let content = fs::read_to_string(path)?;
    RobotsConfig::parse(&content)
        .map_err(|e| RobotsError::ConfigError(format!("{}: {}", path.display(), e)))
}
