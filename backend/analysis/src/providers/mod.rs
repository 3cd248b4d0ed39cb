pub mod gemini;
pub mod mock;
pub mod openai;
#[cfg(test)]
pub(crate) mod stub_server;

use std::sync::Arc;
use std::time::Duration;

use plastiscan_config::Settings;
use plastiscan_core::{AnalysisProvider, Result, ScanError};
use plastiscan_logging::redact_sensitive_data;
use reqwest::Client;

pub use gemini::GeminiProvider;
pub use mock::{canned_report, MockProvider};
pub use openai::OpenAiProvider;

/// Longest provider error body kept in an error message.
const MAX_ERROR_EXCERPT: usize = 500;

/// Build the provider selected by `analysis.provider`.
pub fn build_provider(settings: &Settings) -> Result<Arc<dyn AnalysisProvider>> {
    match settings.provider.as_str() {
        "gemini" => {
            let key = settings.gemini.api_key.clone().ok_or_else(|| {
                ScanError::Config("no Gemini API key; set GEMINI_API_KEY or providers.gemini.apiKey".into())
            })?;
            let provider = GeminiProvider::new(key, settings.timeout)?
                .with_base_url(&settings.gemini.base_url);
            Ok(Arc::new(provider))
        }
        "openai" => {
            // Local OpenAI-compatible servers usually run without a key.
            let provider = OpenAiProvider::new(settings.openai.api_key.clone(), settings.timeout)?
                .with_base_url(&settings.openai.base_url);
            Ok(Arc::new(provider))
        }
        "mock" => Ok(Arc::new(MockProvider::new("mock"))),
        other => Err(ScanError::Config(format!("unknown provider '{other}'"))),
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("plastiscan/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ScanError::Other(anyhow::anyhow!("failed to build HTTP client: {e}")))
}

pub(crate) fn send_error(provider: &str, err: reqwest::Error, timeout: Duration) -> ScanError {
    if err.is_timeout() {
        return ScanError::provider(
            provider,
            format!("request timed out after {timeout:?}"),
        );
    }
    ScanError::provider(provider, redact_sensitive_data(&format!("request failed: {err}")))
}

/// First `MAX_ERROR_EXCERPT` characters of an error body, whitespace collapsed.
pub(crate) fn error_excerpt(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_EXCERPT {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(MAX_ERROR_EXCERPT).collect();
    cut.push('…');
    cut
}
