//! Analysis Event Logger
//!
//! Structured events (started, completed, failed) for each analysis, emitted
//! under the `analysis_events` target so they land in the NDJSON log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum AnalysisEvent {
    Started {
        provider: String,
        model: String,
        image_count: usize,
        total_bytes: usize,
    },
    Completed {
        severity_score: u8,
        particle_count: u32,
        tokens_used: u64,
        latency_ms: u64,
    },
    Failed {
        kind: String,
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct AnalysisLogEntry {
    pub analysis_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: AnalysisEvent,
}

pub struct AnalysisLog;

impl AnalysisLog {
    /// Logs an analysis lifecycle event, redacting error text first.
    pub fn log_event(analysis_id: &str, mut event: AnalysisEvent) -> AnalysisLogEntry {
        if let AnalysisEvent::Failed { error_msg, .. } = &mut event {
            *error_msg = redact_sensitive_data(error_msg);
        }

        let entry = AnalysisLogEntry {
            analysis_id: analysis_id.into(),
            timestamp: Utc::now(),
            event,
        };

        let json = serde_json::to_string(&entry).unwrap_or_default();
        match &entry.event {
            AnalysisEvent::Failed { .. } => {
                warn!(target: "analysis_events", event = %json, "Analysis event")
            }
            _ => info!(target: "analysis_events", event = %json, "Analysis event"),
        }
        entry
    }
}
