//! Contamination report model.
//!
//! The shape the remote model is asked to return, plus the normalization that
//! keeps every rendered report inside its documented ranges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::traits::ProviderResponse;

pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 10;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Structured contamination report parsed from the model's JSON answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContaminationReport {
    pub sample_summary: String,

    #[serde(deserialize_with = "lenient_u32")]
    pub estimated_particle_count: u32,

    /// Human-readable density estimate, e.g. "~120 particles per litre".
    #[serde(default)]
    pub particle_density: String,

    #[serde(deserialize_with = "lenient_score")]
    pub severity_score: u8,

    #[serde(default)]
    pub severity_rationale: String,

    #[serde(default)]
    pub particles: Vec<ParticleFinding>,

    #[serde(default)]
    pub sources: Vec<SourceAttribution>,

    #[serde(default)]
    pub health_risks: Vec<HealthRisk>,

    #[serde(default)]
    pub recommendations: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleFinding {
    #[serde(default)]
    pub shape: ParticleShape,
    #[serde(default)]
    pub polymer: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub count: u32,
    #[serde(default)]
    pub size_range: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub percentage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAttribution {
    pub source: String,
    #[serde(default)]
    pub likelihood: Likelihood,
    #[serde(default)]
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRisk {
    pub risk: String,
    #[serde(default)]
    pub level: Likelihood,
    #[serde(default)]
    pub description: String,
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Morphological class of a detected particle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleShape {
    Fiber,
    Fragment,
    Film,
    Bead,
    Foam,
    #[default]
    Other,
}

impl ParticleShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fiber => "fiber",
            Self::Fragment => "fragment",
            Self::Film => "film",
            Self::Bead => "bead",
            Self::Foam => "foam",
            Self::Other => "other",
        }
    }

    /// Map free-form model vocabulary onto a shape class.
    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        match lower.trim_end_matches('s') {
            "fiber" | "fibre" | "filament" | "microfiber" | "microfibre" => Self::Fiber,
            "fragment" | "shard" | "flake" => Self::Fragment,
            "film" | "sheet" => Self::Film,
            "bead" | "pellet" | "sphere" | "microbead" | "granule" => Self::Bead,
            "foam" => Self::Foam,
            _ => Self::Other,
        }
    }
}

impl<'de> Deserialize<'de> for ParticleShape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Three-step qualitative scale used for source likelihood and risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Likelihood {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
}

impl Likelihood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" | "minor" | "unlikely" => Self::Low,
            "medium" | "moderate" | "possible" | "likely" => Self::Medium,
            "high" | "very high" | "severe" | "critical" | "very likely" => Self::High,
            _ => Self::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for Likelihood {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Band derived from the 1–10 severity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl SeverityLevel {
    pub fn from_score(score: u8) -> Self {
        match score.clamp(MIN_SEVERITY, MAX_SEVERITY) {
            1..=3 => Self::Low,
            4..=6 => Self::Moderate,
            7..=8 => Self::High,
            _ => Self::Critical,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

impl ContaminationReport {
    pub fn severity_level(&self) -> SeverityLevel {
        SeverityLevel::from_score(self.severity_score)
    }

    /// Clamp every numeric field into range, trim text, and order findings
    /// from most to least significant.
    pub fn normalize(mut self) -> Self {
        self.severity_score = self.severity_score.clamp(MIN_SEVERITY, MAX_SEVERITY);
        self.confidence = self
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0));

        self.sample_summary = self.sample_summary.trim().to_string();
        self.particle_density = self.particle_density.trim().to_string();
        self.severity_rationale = self.severity_rationale.trim().to_string();

        for p in &mut self.particles {
            p.percentage = if p.percentage.is_finite() {
                p.percentage.clamp(0.0, 100.0)
            } else {
                0.0
            };
            p.polymer = p.polymer.trim().to_string();
        }
        self.particles.sort_by(|a, b| b.count.cmp(&a.count));

        self.sources.retain(|s| !s.source.trim().is_empty());
        self.sources.sort_by(|a, b| b.likelihood.cmp(&a.likelihood));

        self.health_risks.retain(|r| !r.risk.trim().is_empty());
        self.health_risks.sort_by(|a, b| b.level.cmp(&a.level));

        self.recommendations = self
            .recommendations
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        self
    }
}

/// Accept integers, floats, or numeric strings; negative values become 0.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let v = serde_json::Value::deserialize(deserializer)?;
    let n = number_of(&v).ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {v}")))?;
    Ok(n.round().clamp(0.0, u32::MAX as f64) as u32)
}

/// Severity may arrive out of range; `normalize` clamps it afterwards.
fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let v = serde_json::Value::deserialize(deserializer)?;
    let n = number_of(&v).ok_or_else(|| serde::de::Error::custom(format!("expected a severity score, got {v}")))?;
    Ok(n.round().clamp(0.0, u8::MAX as f64) as u8)
}

fn number_of(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// A finished analysis: the report plus the metadata of the call that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    pub image_count: usize,
    pub tokens_used: u64,
    pub latency_ms: u64,
    pub severity_level: SeverityLevel,
    pub report: ContaminationReport,
}

impl AnalysisOutcome {
    pub fn new(
        id: Uuid,
        report: ContaminationReport,
        response: &ProviderResponse,
        image_count: usize,
    ) -> Self {
        Self {
            id,
            analyzed_at: Utc::now(),
            provider: response.provider.clone(),
            model: response.model.clone(),
            image_count,
            tokens_used: response.tokens_used,
            latency_ms: response.latency_ms,
            severity_level: report.severity_level(),
            report,
        }
    }
}
