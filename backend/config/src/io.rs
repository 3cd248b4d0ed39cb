//! Config file location and loading.

use crate::schema::PlastiscanConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the Plastiscan config directory.
/// Priority: `PLASTISCAN_CONFIG_DIR` env > `~/.plastiscan/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PLASTISCAN_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".plastiscan"),
        None => PathBuf::from(".plastiscan"),
    }
}

/// Resolve the full path to the main config file inside a directory.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Resolve which config file to read.
/// Priority: explicit `--config` > `PLASTISCAN_CONFIG` env > config dir.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("PLASTISCAN_CONFIG") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    config_file_path(&config_dir())
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<PlastiscanConfig> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(PlastiscanConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse YAML text; an empty document is the default config.
pub fn parse_config(raw: &str) -> Result<PlastiscanConfig> {
    if raw.trim().is_empty() {
        return Ok(PlastiscanConfig::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}
