use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use plastiscan_core::{AnalysisProvider, AnalysisRequest, ProviderResponse, Result, ScanError};
use plastiscan_logging::redact_sensitive_data;

use crate::providers::{error_excerpt, http_client, send_error};

const PROVIDER: &str = "openai";

/// OpenAI-compatible chat completions provider (OpenAI, Azure-style proxies,
/// local servers speaking the same API).
pub struct OpenAiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            base_url: plastiscan_config::defaults::DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Request body: the instruction as the system message, images as data-URL parts.
pub fn build_request_body(request: &AnalysisRequest) -> Value {
    let mut content = vec![json!({
        "type": "text",
        "text": "Analyze the attached microscope images of the filtered water sample.",
    })];
    content.extend(request.images.iter().map(|img| {
        json!({
            "type": "image_url",
            "image_url": { "url": img.data_url(), "detail": "high" }
        })
    }));

    json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": request.prompt },
            { "role": "user", "content": content }
        ],
        "temperature": request.temperature,
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": "contamination_report",
                "schema": request.response_schema,
                "strict": false
            }
        }
    })
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

fn extract_answer(response: ChatResponse) -> Result<(String, u64)> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or(ScanError::EmptyResponse)?;

    if let Some(refusal) = message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(ScanError::Blocked(refusal));
    }

    let tokens = response.usage.and_then(|u| u.total_tokens).unwrap_or(0);
    Ok((message.content.unwrap_or_default(), tokens))
}

#[async_trait]
impl AnalysisProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<ProviderResponse> {
        let start = Instant::now();
        let body = build_request_body(request);

        debug!(
            model = %request.model,
            images = request.images.len(),
            "Sending request to OpenAI-compatible endpoint"
        );

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| send_error(PROVIDER, e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ScanError::provider(
                PROVIDER,
                format!("{status}: {}", error_excerpt(&redact_sensitive_data(&error_body))),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScanError::provider(PROVIDER, format!("failed to decode response: {e}")))?;

        let (content, tokens_used) = extract_answer(parsed)?;

        Ok(ProviderResponse {
            content,
            provider: PROVIDER.to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::stub_server::{StubServer, LEAKY_ERROR_BODY};
    use crate::schema::response_schema;
    use axum::http::StatusCode;
    use bytes::Bytes;
    use plastiscan_core::SampleImage;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            images: vec![SampleImage::new("a.png", "image/png", Bytes::from_static(&[1, 2, 3]))],
            notes: None,
            prompt: "system instruction".into(),
            response_schema: response_schema(),
            model: "gpt-4o".into(),
            temperature: 0.1,
        }
    }

    #[test]
    fn body_carries_data_urls_and_schema() {
        let body = build_request_body(&request());
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "system instruction");
        let parts = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,AQID");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["schema"]["type"], "object");
    }

    #[test]
    fn extracts_content_and_usage() {
        let parsed: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "{}" } }],
            "usage": { "total_tokens": 99 }
        }))
        .unwrap();
        assert_eq!(extract_answer(parsed).unwrap(), ("{}".to_string(), 99));
    }

    #[test]
    fn refusal_is_blocked() {
        let parsed: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": null, "refusal": "I can't help with that." } }]
        }))
        .unwrap();
        assert!(matches!(extract_answer(parsed), Err(ScanError::Blocked(_))));
    }

    #[tokio::test]
    async fn error_status_becomes_redacted_provider_error() {
        let server =
            StubServer::start(StatusCode::UNAUTHORIZED, LEAKY_ERROR_BODY, Duration::ZERO).await;
        let provider = OpenAiProvider::new(Some("sk-test-key".into()), Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.base_url);

        let err = provider.analyze(&request()).await.unwrap_err();
        let ScanError::Provider { provider, message } = &err else {
            panic!("expected a provider error, got {err:?}");
        };
        assert_eq!(provider, "openai");
        assert!(message.starts_with("401"), "{message}");
        assert!(!message.contains("AIzaSy"), "{message}");
        assert_eq!(server.last_header("authorization").as_deref(), Some("Bearer sk-test-key"));
    }

    #[tokio::test]
    async fn keyless_server_gets_no_authorization_header() {
        let server = StubServer::start(StatusCode::BAD_GATEWAY, "upstream down", Duration::ZERO).await;
        let provider = OpenAiProvider::new(None, Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.base_url);

        let err = provider.analyze(&request()).await.unwrap_err();
        assert!(err.to_string().contains("upstream down"));
        assert_eq!(server.last_header("authorization"), None);
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = StubServer::start(StatusCode::OK, "{}", Duration::from_secs(5)).await;
        let provider = OpenAiProvider::new(None, Duration::from_millis(200))
            .unwrap()
            .with_base_url(&server.base_url);

        let err = provider.analyze(&request()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"), "{err}");
    }
}
