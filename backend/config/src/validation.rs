//! Config validation: schema checks with user-friendly error messages.

use crate::schema::{PlastiscanConfig, ProviderCredentials};
use thiserror::Error;

/// Provider names the analysis crate knows how to build.
pub const KNOWN_PROVIDERS: &[&str] = &["gemini", "openai", "mock"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &PlastiscanConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_analysis(config, &mut report);
    validate_providers(config, &mut report);
    report
}

fn validate_server(config: &PlastiscanConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    match server.port {
        Some(0) => report.error("server.port", "port must be between 1 and 65535"),
        Some(port) if port < 1024 => report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        ),
        _ => {}
    }
    if server.max_upload_bytes == Some(0) {
        report.error("server.maxUploadBytes", "maxUploadBytes must be > 0");
    }
    if let Some(rate) = &server.rate_limit {
        if rate.window_secs == Some(0) {
            report.error("server.rateLimit.windowSecs", "windowSecs must be > 0");
        }
        if rate.max_requests == Some(0) {
            report.warn(
                "server.rateLimit.maxRequests",
                "maxRequests is 0; rate limiting is disabled",
            );
        }
    }
}

fn validate_analysis(config: &PlastiscanConfig, report: &mut ValidationReport) {
    let Some(analysis) = &config.analysis else { return };
    if let Some(provider) = &analysis.provider {
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            report.error(
                "analysis.provider",
                format!("Unknown provider '{provider}'. Use 'gemini', 'openai', or 'mock'"),
            );
        }
    }
    if let Some(model) = &analysis.model {
        if model.trim().is_empty() {
            report.error("analysis.model", "model cannot be empty");
        }
    }
    if let Some(t) = analysis.temperature {
        if !(0.0..=2.0).contains(&t) {
            report.error("analysis.temperature", format!("temperature {t} is outside 0..=2"));
        }
    }
    if analysis.max_images == Some(0) {
        report.error("analysis.maxImages", "maxImages must be >= 1");
    }
    if analysis.max_image_bytes == Some(0) {
        report.error("analysis.maxImageBytes", "maxImageBytes must be > 0");
    }
    if analysis.timeout_secs == Some(0) {
        report.error("analysis.timeoutSecs", "timeoutSecs must be > 0");
    }
    if let (Some(server), Some(per_image)) = (&config.server, analysis.max_image_bytes) {
        if let Some(body) = server.max_upload_bytes {
            if per_image > body {
                report.warn(
                    "analysis.maxImageBytes",
                    "maxImageBytes exceeds server.maxUploadBytes; large images will be cut off by the body limit",
                );
            }
        }
    }
}

fn validate_providers(config: &PlastiscanConfig, report: &mut ValidationReport) {
    let selected = config
        .analysis
        .as_ref()
        .and_then(|a| a.provider.as_deref())
        .unwrap_or(crate::defaults::DEFAULT_PROVIDER);

    let providers = config.providers.as_ref();
    for (name, creds) in [
        ("gemini", providers.and_then(|p| p.gemini.as_ref())),
        ("openai", providers.and_then(|p| p.openai.as_ref())),
    ] {
        if let Some(creds) = creds {
            validate_base_url(name, creds, report);
        }
        if name == selected && creds.and_then(|c| c.api_key.as_deref()).map_or(true, str::is_empty) {
            report.warn(
                format!("providers.{name}.apiKey"),
                format!("No API key for the selected provider '{name}'; analyses will fail"),
            );
        }
    }
}

fn validate_base_url(name: &str, creds: &ProviderCredentials, report: &mut ValidationReport) {
    let Some(url) = &creds.base_url else { return };
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        report.error(
            format!("providers.{name}.baseUrl"),
            format!("baseUrl '{url}' must start with http:// or https://"),
        );
    }
}
