//! Renderers for analysis outcomes.
//!
//! The Markdown document is the canonical rendering. HTML is produced from it
//! through pulldown-cmark; the terminal view is drawn directly with ANSI codes.

pub mod html;
pub mod markdown;
pub mod terminal;

pub use html::{escape_html, escape_markdown, render_dashboard, render_upload_page, to_html_fragment, Thumbnail};
pub use markdown::{severity_gauge, to_markdown};
pub use terminal::{supports_color, to_ansi, to_ansi_with};

#[cfg(test)]
pub(crate) mod fixtures {
    use plastiscan_core::{
        AnalysisOutcome, ContaminationReport, HealthRisk, Likelihood, ParticleFinding,
        ParticleShape, ProviderResponse, SourceAttribution,
    };
    use uuid::Uuid;

    pub fn outcome() -> AnalysisOutcome {
        let report = ContaminationReport {
            sample_summary: "Fibres dominate the <filter> field.".into(),
            estimated_particle_count: 42,
            particle_density: "~84 particles/L".into(),
            severity_score: 7,
            severity_rationale: "Above typical tap water levels.".into(),
            particles: vec![
                ParticleFinding {
                    shape: ParticleShape::Fiber,
                    polymer: "polyester | PET".into(),
                    count: 30,
                    size_range: "0.1-2 mm".into(),
                    color: "blue".into(),
                    percentage: 71.4,
                },
                ParticleFinding {
                    shape: ParticleShape::Fragment,
                    polymer: "polyethylene".into(),
                    count: 12,
                    size_range: "0.5-1 mm".into(),
                    color: "white".into(),
                    percentage: 28.6,
                },
            ],
            sources: vec![SourceAttribution {
                source: "Synthetic textile laundering".into(),
                likelihood: Likelihood::High,
                evidence: "Long coloured fibres.".into(),
            }],
            health_risks: vec![HealthRisk {
                risk: "Ingestion".into(),
                level: Likelihood::Medium,
                description: "Chronic low-dose exposure.".into(),
            }],
            recommendations: vec!["Install a laundry filter.".into()],
            confidence: Some(0.8),
        };
        let response = ProviderResponse {
            content: String::new(),
            provider: "mock".into(),
            model: "mock".into(),
            tokens_used: 1200,
            latency_ms: 850,
        };
        AnalysisOutcome::new(Uuid::nil(), report, &response, 2)
    }
}
