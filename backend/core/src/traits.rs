use async_trait::async_trait;
use serde_json::Value;

use crate::image::SampleImage;
use crate::Result;

/// Trait for the remote models that produce contamination reports.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Provider name (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Send the images with the fixed instruction and return the raw text
    /// the model produced.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<ProviderResponse>;
}

/// A single multimodal request to an analysis provider.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub images: Vec<SampleImage>,
    /// Free-text sample context supplied by the user; already folded into
    /// `prompt`. The mock provider echoes it in its summary.
    pub notes: Option<String>,
    pub prompt: String,
    /// JSON Schema the response must follow.
    pub response_schema: Value,
    pub model: String,
    pub temperature: f32,
}

/// Raw response from an analysis provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
