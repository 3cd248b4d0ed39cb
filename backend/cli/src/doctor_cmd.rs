//! CLI Doctor Command
//!
//! Checks the config file, the selected provider's credentials, and whether
//! the provider endpoint answers.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use plastiscan_config::{
    collect_referenced_vars, load_config, prepare, ConfigValidationError, PlastiscanConfig,
    Settings,
};

use crate::notes::{note_error, note_info, note_success, note_warn};

const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
struct Check {
    status: Status,
    message: String,
}

impl Check {
    fn pass(message: impl Into<String>) -> Self {
        Self { status: Status::Pass, message: message.into() }
    }
    fn warn(message: impl Into<String>) -> Self {
        Self { status: Status::Warn, message: message.into() }
    }
    fn fail(message: impl Into<String>) -> Self {
        Self { status: Status::Fail, message: message.into() }
    }

    fn print(&self) {
        match self.status {
            Status::Pass => note_success(&self.message),
            Status::Warn => note_warn(&self.message),
            Status::Fail => note_error(&self.message),
        }
    }
}

/// Executes the full doctor diagnosis. Returns whether every check passed
/// (warnings allowed).
pub async fn run(config_path: &Path) -> Result<bool> {
    println!("\nRunning Plastiscan doctor...\n");

    let env: HashMap<String, String> = std::env::vars().collect();
    let mut checks = vec![check_config_file(config_path).await];
    let settings = match load_config(config_path).await {
        Ok(raw) => {
            checks.extend(check_env_references(&raw, &env));
            match prepare(raw, &env) {
                Ok((config, warnings)) => {
                    checks.extend(warning_checks(warnings));
                    Some(Settings::from_config(&config))
                }
                Err(e) => {
                    checks.push(Check::fail(format!("Config is invalid: {e:#}")));
                    None
                }
            }
        }
        Err(e) => {
            checks.push(Check::fail(format!("Config could not be read: {e:#}")));
            None
        }
    };

    if let Some(settings) = &settings {
        note_info(&format!(
            "Provider: {} (model {})",
            settings.provider, settings.model
        ));
        checks.push(check_api_key(settings));
        checks.push(check_reachability(settings).await);
    }

    for check in &checks {
        check.print();
    }

    let healthy = checks.iter().all(|c| c.status != Status::Fail);
    println!();
    if healthy {
        note_success("All checks passed.");
    } else {
        note_error("Some checks failed. Fix the errors above.");
    }
    Ok(healthy)
}

async fn check_config_file(config_path: &Path) -> Check {
    if tokio::fs::try_exists(config_path).await.unwrap_or(false) {
        Check::pass(format!("Config file found at {}", config_path.display()))
    } else {
        Check::warn(format!(
            "No config file at {}, using defaults and environment",
            config_path.display()
        ))
    }
}

/// One check per `${VAR}` the config file references.
fn check_env_references(raw: &PlastiscanConfig, env: &HashMap<String, String>) -> Vec<Check> {
    let value = match serde_json::to_value(raw) {
        Ok(v) => v,
        Err(e) => return vec![Check::fail(format!("Failed to inspect config: {e}"))],
    };
    collect_referenced_vars(&value)
        .into_iter()
        .map(|var| match env.get(&var) {
            Some(v) if !v.is_empty() => Check::pass(format!("${{{var}}} is set")),
            _ => Check::fail(format!("${{{var}}} is referenced by the config but not set")),
        })
        .collect()
}

/// Validation warnings, minus the API key one that `check_api_key` reports.
fn warning_checks(warnings: Vec<ConfigValidationError>) -> Vec<Check> {
    warnings
        .into_iter()
        .filter(|w| !w.path.ends_with(".apiKey"))
        .map(|w| Check::warn(format!("{}: {}", w.path, w.message)))
        .collect()
}

fn check_api_key(settings: &Settings) -> Check {
    match settings.selected_provider() {
        None => Check::pass(format!("Provider '{}' needs no API key", settings.provider)),
        Some(p) if p.api_key.is_some() => {
            Check::pass(format!("API key for '{}' is set", settings.provider))
        }
        Some(_) if settings.provider == "gemini" => Check::fail(
            "No Gemini API key: set GEMINI_API_KEY or providers.gemini.apiKey",
        ),
        Some(_) => Check::warn(format!(
            "No API key for '{}' (fine for keyless OpenAI-compatible servers)",
            settings.provider
        )),
    }
}

async fn check_reachability(settings: &Settings) -> Check {
    let Some(provider) = settings.selected_provider() else {
        return Check::pass("Offline provider, no endpoint to reach");
    };

    let client = match reqwest::Client::builder().timeout(REACHABILITY_TIMEOUT).build() {
        Ok(c) => c,
        Err(e) => return Check::fail(format!("Failed to build HTTP client: {e}")),
    };

    // Any HTTP answer counts; only transport failures are fatal.
    match client.get(&provider.base_url).send().await {
        Ok(resp) => Check::pass(format!(
            "{} is reachable (HTTP {})",
            provider.base_url,
            resp.status().as_u16()
        )),
        Err(e) => Check::fail(format!("{} is unreachable: {e}", provider.base_url)),
    }
}
