pub mod error;
pub mod image;
pub mod report;
pub mod traits;

pub use error::ScanError;
pub use image::SampleImage;
pub use report::{
    AnalysisOutcome, ContaminationReport, HealthRisk, Likelihood, ParticleFinding, ParticleShape,
    SeverityLevel, SourceAttribution,
};
pub use traits::{AnalysisProvider, AnalysisRequest, ProviderResponse};

/// Result alias used across Plastiscan crates.
pub type Result<T> = std::result::Result<T, ScanError>;
