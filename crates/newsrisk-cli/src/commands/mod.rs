//! Subcommands.

pub mod analyze;
pub mod batch;
pub mod config;
pub mod models;

use std::path::{Path, PathBuf};

use newsrisk_core::NewsRiskConfig;
use tracing::debug;

/// Environment variable consulted for the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsrisk")
        .join("config.json")
}

/// The `--config` path, or the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration from `path`, falling back to defaults when it does not
/// exist yet. An explicitly given path must exist.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<NewsRiskConfig> {
    let path = config_path(explicit);

    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(NewsRiskConfig::from_file(&path)?)
    } else if explicit.is_some() {
        anyhow::bail!("Config file not found: {}", path.display());
    } else {
        Ok(NewsRiskConfig::default())
    }
}

/// Apply the API key precedence: flag, then environment, then file.
pub fn resolve_api_key(config: &mut NewsRiskConfig, flag: Option<&str>) {
    if let Some(key) = flag {
        config.api.api_key = key.trim().to_string();
    } else if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            config.api.api_key = key.trim().to_string();
        }
    }
}

/// Save configuration, creating the parent directory if needed.
pub fn save_config(config: &NewsRiskConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    config.save(path)?;
    Ok(())
}
