use async_trait::async_trait;
use serde_json::json;

use plastiscan_core::{AnalysisProvider, AnalysisRequest, ProviderResponse, Result, ScanError};

/// A provider that answers without the network. Serves offline demos
/// (`provider: mock`) and tests.
pub struct MockProvider {
    name: String,
    fixed_response: Option<String>,
    failure: Option<String>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            failure: None,
        }
    }

    /// Return this exact text instead of the canned report.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Fail every call with a provider error carrying this message.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

/// A plausible report whose counts scale with the number of images. Sample
/// notes, when given, are echoed at the end of the summary.
pub fn canned_report(image_count: usize, notes: Option<&str>) -> serde_json::Value {
    let fibers = 21 * image_count.max(1) as u32;
    let fragments = 9 * image_count.max(1) as u32;
    let films = 3 * image_count.max(1) as u32;
    let total = fibers + fragments + films;
    let pct = |n: u32| (n as f64 * 1000.0 / total as f64).round() / 10.0;

    let mut summary = String::from(
        "Demonstration report. The filter shows predominantly blue and black synthetic fibres with a smaller number of angular fragments and thin films.",
    );
    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        summary.push_str(" Sample notes: ");
        summary.push_str(notes);
    }

    json!({
        "sampleSummary": summary,
        "estimatedParticleCount": total,
        "particleDensity": format!("~{} particles per litre (assuming 1 L filtered)", total),
        "severityScore": 6,
        "severityRationale": "Particle density is above typical treated tap water but below heavily polluted surface water.",
        "particles": [
            { "shape": "fiber", "polymer": "PET (polyester)", "count": fibers, "sizeRange": "150-1200 µm", "color": "blue", "percentage": pct(fibers) },
            { "shape": "fragment", "polymer": "PE", "count": fragments, "sizeRange": "40-300 µm", "color": "white", "percentage": pct(fragments) },
            { "shape": "film", "polymer": "PP", "count": films, "sizeRange": "200-600 µm", "color": "transparent", "percentage": pct(films) }
        ],
        "sources": [
            { "source": "Synthetic textile laundering", "likelihood": "high", "evidence": "Long, uniform-diameter coloured fibres." },
            { "source": "Packaging breakdown", "likelihood": "medium", "evidence": "Thin translucent films with torn edges." }
        ],
        "healthRisks": [
            { "risk": "Chemical additive exposure", "level": "medium", "description": "Plasticisers and dyes can leach from fibres." },
            { "risk": "Particle ingestion", "level": "low", "description": "Most particles are large enough to be removed by household filtration." }
        ],
        "recommendations": [
            "Fit a point-of-use filter rated below 1 µm.",
            "Repeat sampling with a procedural blank to rule out airborne fibre contamination."
        ],
        "confidence": 0.5
    })
}

#[async_trait]
impl AnalysisProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<ProviderResponse> {
        if let Some(message) = &self.failure {
            return Err(ScanError::provider(self.name.clone(), message.clone()));
        }
        let content = match &self.fixed_response {
            Some(text) => text.clone(),
            None => canned_report(request.images.len(), request.notes.as_deref()).to_string(),
        };
        Ok(ProviderResponse {
            content,
            provider: self.name.clone(),
            model: request.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}
