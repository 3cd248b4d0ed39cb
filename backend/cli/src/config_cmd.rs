//! `plastiscan config show|path`.

use std::path::Path;

use anyhow::{Context, Result};
use plastiscan_config::{collect_redacted_paths, redact, PlastiscanConfig};

pub fn path(config_path: &Path) {
    println!("{}", config_path.display());
}

pub fn show(config: &PlastiscanConfig) -> Result<()> {
    print!("{}", render_redacted(config)?);
    Ok(())
}

/// Redacted YAML, headed by a comment naming each masked field.
fn render_redacted(config: &PlastiscanConfig) -> Result<String> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    let yaml = serde_yaml::to_string(&redact(&value)).context("Failed to render config as YAML")?;
    let header: String = collect_redacted_paths(&value)
        .iter()
        .map(|path| format!("# redacted: {path}\n"))
        .collect();
    Ok(header + &yaml)
}
