//! Turn the model's text answer into a normalized report.

use plastiscan_core::{ContaminationReport, Result, ScanError};
use tracing::debug;

/// Parse and normalize a report from raw model output.
///
/// Accepts bare JSON, JSON inside a Markdown code fence, or JSON surrounded by
/// stray prose; the outermost `{...}` span is tried when the whole text fails.
pub fn parse_report(text: &str) -> Result<ContaminationReport> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ScanError::EmptyResponse);
    }

    let body = strip_code_fence(trimmed);
    let report = match serde_json::from_str::<ContaminationReport>(body) {
        Ok(report) => report,
        Err(first_err) => {
            let Some(span) = outermost_object(body) else {
                return Err(ScanError::MalformedReport(first_err.to_string()));
            };
            debug!("Retrying report parse on the outermost JSON object");
            serde_json::from_str::<ContaminationReport>(span)
                .map_err(|e| ScanError::MalformedReport(e.to_string()))?
        }
    };

    Ok(report.normalize())
}

/// Remove a surrounding ```json ... ``` fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the info string (e.g. "json") up to the first newline.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use plastiscan_core::SeverityLevel;

    const REPORT: &str = r#"{
        "sampleSummary": "Moderate fragment load.",
        "estimatedParticleCount": 18,
        "particleDensity": "~36 particles/L",
        "severityScore": 5,
        "severityRationale": "Typical for urban surface water.",
        "particles": [],
        "sources": [],
        "healthRisks": [],
        "recommendations": ["Re-sample after rainfall"]
    }"#;

    #[test]
    fn parses_bare_json() {
        let report = parse_report(REPORT).unwrap();
        assert_eq!(report.estimated_particle_count, 18);
        assert_eq!(report.severity_level(), SeverityLevel::Moderate);
    }

    #[test]
    fn parses_fenced_json() {
        let fenced = format!("```json\n{REPORT}\n```");
        assert_eq!(parse_report(&fenced).unwrap().severity_score, 5);
    }

    #[test]
    fn parses_json_wrapped_in_prose() {
        let wrapped = format!("Here is the analysis you asked for:\n{REPORT}\nLet me know!");
        assert_eq!(parse_report(&wrapped).unwrap().severity_score, 5);
    }

    #[test]
    fn empty_text_is_empty_response() {
        assert!(matches!(parse_report("  \n "), Err(ScanError::EmptyResponse)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(parse_report("I cannot help with that."), Err(ScanError::MalformedReport(_))));
        assert!(matches!(parse_report("{\"sampleSummary\": 3}"), Err(ScanError::MalformedReport(_))));
    }

    #[test]
    fn out_of_range_severity_is_clamped() {
        let high = REPORT.replace("\"severityScore\": 5", "\"severityScore\": 42");
        assert_eq!(parse_report(&high).unwrap().severity_score, 10);
    }
}
