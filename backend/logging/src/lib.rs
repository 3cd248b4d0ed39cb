//! Telemetry and structured logging components for Plastiscan.
//!
//! Handles log redaction, console/JSON output, daily file rotation, and the
//! per-analysis event log.

pub mod analysis_log;
pub mod logger;
pub mod redact;

pub use analysis_log::{AnalysisEvent, AnalysisLog, AnalysisLogEntry};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
