//! `plastiscan-config`: Plastiscan runtime configuration management.
//!
//! Provides:
//! - Typed config schema (server, analysis, providers, logging)
//! - YAML loading from `~/.plastiscan/config.yaml` or an explicit path
//! - `${ENV_VAR}` substitution
//! - Environment overrides
//! - Default value application
//! - Validation
//! - Config redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod overrides;
pub mod redact;
pub mod schema;
pub mod settings;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, parse_config, resolve_config_path};
pub use overrides::apply_env_overrides_with;
pub use redact::{collect_redacted_paths, redact};
pub use schema::PlastiscanConfig;
pub use settings::{ProviderSettings, Settings};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Load, substitute env vars, apply env overrides and defaults, then validate.
///
/// This is the main entry point for loading a config at runtime. Validation
/// errors fail the load. Warnings are returned for the caller to report once
/// its logger is up.
pub async fn load_and_prepare(
    path: &Path,
) -> Result<(PlastiscanConfig, Vec<ConfigValidationError>)> {
    let raw = load_config(path).await?;
    prepare(raw, &std::env::vars().collect())
}

/// The pure half of `load_and_prepare`, with an injectable environment.
pub fn prepare(
    raw: PlastiscanConfig,
    env: &HashMap<String, String>,
) -> Result<(PlastiscanConfig, Vec<ConfigValidationError>)> {
    let value = serde_json::to_value(&raw).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: PlastiscanConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides_with(config, env);
    let config = apply_all_defaults(config);

    let report = validate(&config);
    if !report.is_valid() {
        let messages: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        bail!("Invalid configuration:\n  {}", messages.join("\n  "));
    }

    Ok((config, report.warnings))
}
