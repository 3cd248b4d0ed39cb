use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use plastiscan_core::{AnalysisProvider, AnalysisRequest, ProviderResponse, Result, ScanError};
use plastiscan_logging::redact_sensitive_data;

use crate::providers::{error_excerpt, http_client, send_error};
use crate::schema::to_gemini_schema;

const PROVIDER: &str = "gemini";

/// Google Gemini `generateContent` provider with structured JSON output.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            base_url: plastiscan_config::defaults::DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

/// Request body: the prompt first, then one inline part per image.
pub fn build_request_body(request: &AnalysisRequest) -> Value {
    let mut parts = vec![json!({ "text": request.prompt })];
    parts.extend(request.images.iter().map(|img| {
        json!({
            "inlineData": {
                "mimeType": img.mime_type,
                "data": img.to_base64(),
            }
        })
    }));

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": to_gemini_schema(&request.response_schema),
            "temperature": request.temperature,
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u64>,
}

/// Pull the answer text and token count out of a `generateContent` response.
fn extract_answer(response: GenerateContentResponse) -> Result<(String, u64)> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ScanError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ScanError::EmptyResponse)?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if matches!(reason, "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" | "RECITATION") {
            return Err(ScanError::Blocked(reason.to_string()));
        }
        if reason == "MAX_TOKENS" {
            warn!("Gemini stopped at the output token limit; report may be truncated");
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text)
        .collect();

    let tokens = response
        .usage_metadata
        .and_then(|u| u.total_token_count)
        .unwrap_or(0);

    Ok((text, tokens))
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<ProviderResponse> {
        let start = Instant::now();
        let body = build_request_body(request);

        debug!(
            model = %request.model,
            images = request.images.len(),
            "Sending request to Gemini"
        );

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
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

        let parsed: GenerateContentResponse = response
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
            images: vec![
                SampleImage::new("a.png", "image/png", Bytes::from_static(&[1, 2, 3])),
                SampleImage::new("b.jpg", "image/jpeg", Bytes::from_static(&[4, 5])),
            ],
            notes: None,
            prompt: "analyze".into(),
            response_schema: response_schema(),
            model: "gemini-2.5-flash".into(),
            temperature: 0.2,
        }
    }

    #[test]
    fn body_has_prompt_then_inline_images() {
        let body = build_request_body(&request());
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["text"], "analyze");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "AQID");
        assert_eq!(parts[2]["inlineData"]["mimeType"], "image/jpeg");

        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn endpoint_uses_model_path() {
        let provider = GeminiProvider::new("k", Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(
            provider.endpoint("gemini-2.5-flash"),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn extracts_text_and_skips_thoughts() {
        let raw = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": "{\"a\":" },
                    { "text": "1}" }
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": { "totalTokenCount": 812 }
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let (text, tokens) = extract_answer(parsed).unwrap();
        assert_eq!(text, "{\"a\":1}");
        assert_eq!(tokens, 812);
    }

    #[test]
    fn prompt_block_is_reported() {
        let raw = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert!(matches!(extract_answer(parsed), Err(ScanError::Blocked(r)) if r == "SAFETY"));
    }

    #[test]
    fn safety_finish_is_blocked() {
        let raw = json!({ "candidates": [{ "finishReason": "PROHIBITED_CONTENT" }] });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert!(matches!(extract_answer(parsed), Err(ScanError::Blocked(_))));
    }

    #[test]
    fn no_candidates_is_empty() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(extract_answer(parsed), Err(ScanError::EmptyResponse)));
    }

    #[tokio::test]
    async fn error_status_becomes_redacted_provider_error() {
        let server =
            StubServer::start(StatusCode::INTERNAL_SERVER_ERROR, LEAKY_ERROR_BODY, Duration::ZERO)
                .await;
        let provider = GeminiProvider::new("AIza-test-key", Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.base_url);

        let err = provider.analyze(&request()).await.unwrap_err();
        let ScanError::Provider { provider, message } = &err else {
            panic!("expected a provider error, got {err:?}");
        };
        assert_eq!(provider, "gemini");
        assert!(message.starts_with("500"), "{message}");
        assert!(message.contains("rejected"));
        assert!(!message.contains("AIzaSy"), "{message}");
        assert_eq!(server.last_header("x-goog-api-key").as_deref(), Some("AIza-test-key"));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = StubServer::start(StatusCode::OK, "{}", Duration::from_secs(5)).await;
        let provider = GeminiProvider::new("AIza-test-key", Duration::from_millis(200))
            .unwrap()
            .with_base_url(&server.base_url);

        let err = provider.analyze(&request()).await.unwrap_err();
        assert!(matches!(&err, ScanError::Provider { .. }));
        assert!(err.to_string().contains("timed out after 200ms"), "{err}");
    }
}
