//! Config defaults: applies sensible default values to parsed config.

use crate::schema::{
    AnalysisConfig, LoggingConfig, PlastiscanConfig, ProviderCredentials, ProvidersConfig,
    RateLimitConfig, ServerConfig,
};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// 50 MiB request body limit for multipart uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub const DEFAULT_RATE_LIMIT_MAX: u32 = 10;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_MOCK_MODEL: &str = "mock";

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_IMAGES: usize = 8;

/// 10 MiB per image keeps a full batch under Gemini's inline request cap.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default model for a provider name.
pub fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "openai" => DEFAULT_OPENAI_MODEL,
        "mock" => DEFAULT_MOCK_MODEL,
        _ => DEFAULT_GEMINI_MODEL,
    }
}

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: PlastiscanConfig) -> PlastiscanConfig {
    let config = apply_server_defaults(config);
    let config = apply_analysis_defaults(config);
    let config = apply_provider_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: PlastiscanConfig) -> PlastiscanConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server.max_upload_bytes.get_or_insert(DEFAULT_MAX_UPLOAD_BYTES);

    let rate = server.rate_limit.get_or_insert_with(RateLimitConfig::default);
    rate.max_requests.get_or_insert(DEFAULT_RATE_LIMIT_MAX);
    rate.window_secs.get_or_insert(DEFAULT_RATE_LIMIT_WINDOW_SECS);
    config
}

/// The model default depends on the provider, so the provider is settled first.
fn apply_analysis_defaults(mut config: PlastiscanConfig) -> PlastiscanConfig {
    let analysis = config.analysis.get_or_insert_with(AnalysisConfig::default);
    let provider = analysis
        .provider
        .get_or_insert_with(|| DEFAULT_PROVIDER.to_string())
        .clone();
    if analysis.model.is_none() {
        analysis.model = Some(default_model_for(&provider).to_string());
    }
    analysis.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    analysis.timeout_secs.get_or_insert(DEFAULT_TIMEOUT_SECS);
    analysis.max_images.get_or_insert(DEFAULT_MAX_IMAGES);
    analysis.max_image_bytes.get_or_insert(DEFAULT_MAX_IMAGE_BYTES);
    config
}

fn apply_provider_defaults(mut config: PlastiscanConfig) -> PlastiscanConfig {
    let providers = config.providers.get_or_insert_with(ProvidersConfig::default);
    providers
        .gemini
        .get_or_insert_with(ProviderCredentials::default)
        .base_url
        .get_or_insert_with(|| DEFAULT_GEMINI_BASE_URL.to_string());
    providers
        .openai
        .get_or_insert_with(ProviderCredentials::default)
        .base_url
        .get_or_insert_with(|| DEFAULT_OPENAI_BASE_URL.to_string());
    config
}

fn apply_logging_defaults(mut config: PlastiscanConfig) -> PlastiscanConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| DEFAULT_LOG_DIR.to_string());
    logging.json.get_or_insert(false);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_section() {
        let cfg = apply_all_defaults(PlastiscanConfig::default());
        let server = cfg.server.unwrap();
        assert_eq!(server.port, Some(DEFAULT_PORT));
        assert_eq!(server.rate_limit.unwrap().max_requests, Some(DEFAULT_RATE_LIMIT_MAX));
        let analysis = cfg.analysis.unwrap();
        assert_eq!(analysis.provider.as_deref(), Some("gemini"));
        assert_eq!(analysis.model.as_deref(), Some(DEFAULT_GEMINI_MODEL));
        assert_eq!(cfg.logging.unwrap().level.as_deref(), Some("info"));
    }

    #[test]
    fn model_default_follows_provider() {
        let mut cfg = PlastiscanConfig::default();
        cfg.analysis = Some(AnalysisConfig {
            provider: Some("openai".into()),
            ..Default::default()
        });
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.analysis.unwrap().model.as_deref(), Some(DEFAULT_OPENAI_MODEL));
    }

    #[test]
    fn does_not_override_user_values() {
        let mut cfg = PlastiscanConfig::default();
        cfg.analysis = Some(AnalysisConfig {
            max_images: Some(3),
            model: Some("gemini-2.5-pro".into()),
            ..Default::default()
        });
        let cfg = apply_all_defaults(cfg);
        let analysis = cfg.analysis.unwrap();
        assert_eq!(analysis.max_images, Some(3));
        assert_eq!(analysis.model.as_deref(), Some("gemini-2.5-pro"));
    }
}
