//! Environment overrides applied on top of the config file.
//!
//! These let a container or a one-off shell run change the essentials
//! without editing `config.yaml`.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::schema::{
    AnalysisConfig, LoggingConfig, PlastiscanConfig, ProviderCredentials, ProvidersConfig,
    ServerConfig,
};

pub const ENV_BIND: &str = "PLASTISCAN_BIND";
pub const ENV_PORT: &str = "PLASTISCAN_PORT";
pub const ENV_PROVIDER: &str = "PLASTISCAN_PROVIDER";
pub const ENV_MODEL: &str = "PLASTISCAN_MODEL";
pub const ENV_LOG_LEVEL: &str = "PLASTISCAN_LOG_LEVEL";
pub const ENV_GEMINI_KEY: &str = "GEMINI_API_KEY";
/// Generic key name used by hosted AI Studio deployments.
pub const ENV_GENERIC_KEY: &str = "API_KEY";
pub const ENV_OPENAI_KEY: &str = "OPENAI_API_KEY";

/// Apply overrides from a provided environment map.
pub fn apply_env_overrides_with(
    mut config: PlastiscanConfig,
    env: &HashMap<String, String>,
) -> PlastiscanConfig {
    let get = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(bind) = get(ENV_BIND) {
        config.server.get_or_insert_with(ServerConfig::default).bind = Some(bind.to_string());
    }
    if let Some(port) = get(ENV_PORT) {
        match port.parse::<u16>() {
            Ok(p) => config.server.get_or_insert_with(ServerConfig::default).port = Some(p),
            Err(_) => warn!(value = %port, "Ignoring invalid {ENV_PORT}"),
        }
    }

    if let Some(provider) = get(ENV_PROVIDER) {
        let analysis = config.analysis.get_or_insert_with(AnalysisConfig::default);
        if analysis.provider.as_deref() != Some(provider) {
            // A model chosen for another provider would not resolve.
            analysis.model = None;
        }
        analysis.provider = Some(provider.to_string());
    }
    if let Some(model) = get(ENV_MODEL) {
        config.analysis.get_or_insert_with(AnalysisConfig::default).model = Some(model.to_string());
    }

    let providers = config.providers.get_or_insert_with(ProvidersConfig::default);
    if let Some(key) = get(ENV_GEMINI_KEY).or_else(|| get(ENV_GENERIC_KEY)) {
        debug!("Using Gemini API key from environment");
        providers.gemini.get_or_insert_with(ProviderCredentials::default).api_key = Some(key.to_string());
    }
    if let Some(key) = get(ENV_OPENAI_KEY) {
        debug!("Using OpenAI API key from environment");
        providers.openai.get_or_insert_with(ProviderCredentials::default).api_key = Some(key.to_string());
    }

    if let Some(level) = get(ENV_LOG_LEVEL) {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level.to_string());
    }

    config
}
