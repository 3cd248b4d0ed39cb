//! One request/response cycle: validate images, call the model, parse the report.

use std::sync::Arc;

use plastiscan_config::Settings;
use plastiscan_core::{
    AnalysisOutcome, AnalysisProvider, AnalysisRequest, Result, SampleImage,
};
use plastiscan_imaging::{validate_batch, ImageLimits};
use plastiscan_logging::{AnalysisEvent, AnalysisLog};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::parse::parse_report;
use crate::prompt::{build_prompt, clean_notes};
use crate::providers::build_provider;
use crate::schema::response_schema;

/// Runs analyses against one configured provider. Cheap to clone.
#[derive(Clone)]
pub struct Analyzer {
    provider: Arc<dyn AnalysisProvider>,
    model: String,
    temperature: f32,
    limits: ImageLimits,
    schema: Arc<Value>,
}

impl Analyzer {
    pub fn new(
        provider: Arc<dyn AnalysisProvider>,
        model: impl Into<String>,
        temperature: f32,
        limits: ImageLimits,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            limits,
            schema: Arc::new(response_schema()),
        }
    }

    /// Build the provider and limits from resolved settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let provider = build_provider(settings)?;
        Ok(Self::new(
            provider,
            settings.model.clone(),
            settings.temperature,
            ImageLimits {
                max_images: settings.max_images,
                max_image_bytes: settings.max_image_bytes,
            },
        ))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Analyze one sample made of one or more images.
    #[instrument(skip_all, fields(provider = %self.provider.name(), model = %self.model, images = images.len()))]
    pub async fn analyze(&self, images: Vec<SampleImage>, notes: Option<&str>) -> Result<AnalysisOutcome> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self.run(id, images, notes).await;
        match &result {
            Ok(outcome) => {
                AnalysisLog::log_event(
                    &id_str,
                    AnalysisEvent::Completed {
                        severity_score: outcome.report.severity_score,
                        particle_count: outcome.report.estimated_particle_count,
                        tokens_used: outcome.tokens_used,
                        latency_ms: outcome.latency_ms,
                    },
                );
            }
            Err(e) => {
                AnalysisLog::log_event(
                    &id_str,
                    AnalysisEvent::Failed {
                        kind: e.kind().to_string(),
                        error_msg: e.to_string(),
                    },
                );
            }
        }
        result
    }

    async fn run(&self, id: Uuid, images: Vec<SampleImage>, notes: Option<&str>) -> Result<AnalysisOutcome> {
        validate_batch(&images, &self.limits)?;

        let image_count = images.len();
        AnalysisLog::log_event(
            &id.to_string(),
            AnalysisEvent::Started {
                provider: self.provider.name().to_string(),
                model: self.model.clone(),
                image_count,
                total_bytes: images.iter().map(SampleImage::size).sum(),
            },
        );

        let notes = clean_notes(notes);
        let request = AnalysisRequest {
            images,
            prompt: build_prompt(notes.as_deref()),
            notes,
            response_schema: (*self.schema).clone(),
            model: self.model.clone(),
            temperature: self.temperature,
        };

        let response = self.provider.analyze(&request).await?;
        let report = parse_report(&response.content)?;

        info!(
            severity = report.severity_score,
            particles = report.estimated_particle_count,
            latency_ms = response.latency_ms,
            "Analysis complete"
        );

        Ok(AnalysisOutcome::new(id, report, &response, image_count))
    }
}
