//! Resolved settings: the fully-defaulted config flattened into plain values.

use std::net::SocketAddr;
use std::time::Duration;

use plastiscan_core::ScanError;

use crate::defaults::*;
use crate::schema::{PlastiscanConfig, ProviderCredentials};

/// Credentials and endpoint for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,

    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_images: usize,
    pub max_image_bytes: usize,

    pub gemini: ProviderSettings,
    pub openai: ProviderSettings,

    pub log_level: String,
    pub log_dir: String,
    pub log_json: bool,
}

impl Settings {
    /// Flatten a config. Missing values fall back to the crate defaults, so
    /// this also works on a config that never went through `apply_all_defaults`.
    pub fn from_config(config: &PlastiscanConfig) -> Self {
        let server = config.server.clone().unwrap_or_default();
        let rate = server.rate_limit.clone().unwrap_or_default();
        let analysis = config.analysis.clone().unwrap_or_default();
        let providers = config.providers.clone().unwrap_or_default();
        let logging = config.logging.clone().unwrap_or_default();

        let provider = analysis.provider.unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let model = analysis
            .model
            .unwrap_or_else(|| default_model_for(&provider).to_string());

        Self {
            bind: server.bind.unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: server.port.unwrap_or(DEFAULT_PORT),
            max_upload_bytes: server.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            rate_limit_max: rate.max_requests.unwrap_or(DEFAULT_RATE_LIMIT_MAX),
            rate_limit_window: Duration::from_secs(
                rate.window_secs.unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            ),
            provider,
            model,
            temperature: analysis.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            timeout: Duration::from_secs(analysis.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            max_images: analysis.max_images.unwrap_or(DEFAULT_MAX_IMAGES),
            max_image_bytes: analysis.max_image_bytes.unwrap_or(DEFAULT_MAX_IMAGE_BYTES),
            gemini: provider_settings(providers.gemini, DEFAULT_GEMINI_BASE_URL),
            openai: provider_settings(providers.openai, DEFAULT_OPENAI_BASE_URL),
            log_level: logging.level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_dir: logging.dir.unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
            log_json: logging.json.unwrap_or(false),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ScanError> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e| ScanError::Config(format!("invalid bind address {}:{}: {e}", self.bind, self.port)))
    }

    /// Settings of the provider selected by `analysis.provider`, if it needs any.
    pub fn selected_provider(&self) -> Option<&ProviderSettings> {
        match self.provider.as_str() {
            "gemini" => Some(&self.gemini),
            "openai" => Some(&self.openai),
            _ => None,
        }
    }
}

fn provider_settings(creds: Option<ProviderCredentials>, default_url: &str) -> ProviderSettings {
    let creds = creds.unwrap_or_default();
    ProviderSettings {
        api_key: creds.api_key.filter(|k| !k.trim().is_empty()),
        base_url: creds
            .base_url
            .unwrap_or_else(|| default_url.to_string())
            .trim_end_matches('/')
            .to_string(),
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&PlastiscanConfig::default())
    }
}
