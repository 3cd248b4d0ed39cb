//! Markdown rendering of an analysis outcome.

use std::fmt::Write;

use plastiscan_core::AnalysisOutcome;

const GAUGE_WIDTH: usize = 10;

/// Render the outcome as a Markdown document.
pub fn to_markdown(outcome: &AnalysisOutcome) -> String {
    render(outcome, &|s: &str| s.to_string())
}

/// `███████░░░` style bar for a 1-10 score.
pub fn severity_gauge(score: u8) -> String {
    let filled = usize::from(score).min(GAUGE_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(GAUGE_WIDTH - filled))
}

/// Render with every piece of model-provided text passed through `text`.
/// The HTML path uses this to escape markup before Markdown conversion.
pub(crate) fn render(outcome: &AnalysisOutcome, text: &dyn Fn(&str) -> String) -> String {
    let report = &outcome.report;
    let cell = |s: &str| table_cell(&text(s));
    let mut md = String::new();

    let _ = writeln!(md, "# Microplastic Analysis Report\n");
    let _ = writeln!(
        md,
        "Analysis `{}` · {} · {} / {} · {} image(s)\n",
        outcome.id,
        outcome.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        text(&outcome.provider),
        text(&outcome.model),
        outcome.image_count,
    );

    let _ = writeln!(md, "## Summary\n");
    let _ = writeln!(md, "{}\n", text(&report.sample_summary));
    let _ = writeln!(
        md,
        "- **Estimated particles:** {}",
        report.estimated_particle_count
    );
    if !report.particle_density.is_empty() {
        let _ = writeln!(md, "- **Density:** {}", text(&report.particle_density));
    }
    if let Some(confidence) = report.confidence {
        let _ = writeln!(md, "- **Confidence:** {:.0}%", confidence * 100.0);
    }
    md.push('\n');

    let _ = writeln!(md, "## Severity\n");
    let _ = writeln!(
        md,
        "**{}/10 ({})** `{}`\n",
        report.severity_score,
        outcome.severity_level.label(),
        severity_gauge(report.severity_score)
    );
    if !report.severity_rationale.is_empty() {
        let _ = writeln!(md, "{}\n", text(&report.severity_rationale));
    }

    let _ = writeln!(md, "## Particles\n");
    if report.particles.is_empty() {
        let _ = writeln!(md, "No particles were identified.\n");
    } else {
        let _ = writeln!(md, "| Shape | Polymer | Count | Size | Color | Share |");
        let _ = writeln!(md, "|---|---|---:|---|---|---:|");
        for p in &report.particles {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} | {} | {:.1}% |",
                p.shape.as_str(),
                cell(&p.polymer),
                p.count,
                cell(&p.size_range),
                cell(&p.color),
                p.percentage
            );
        }
        md.push('\n');
    }

    if !report.sources.is_empty() {
        let _ = writeln!(md, "## Likely Sources\n");
        for s in &report.sources {
            let _ = write!(md, "- **{}** ({})", text(&s.source), s.likelihood.as_str());
            if !s.evidence.is_empty() {
                let _ = write!(md, ": {}", text(&s.evidence));
            }
            md.push('\n');
        }
        md.push('\n');
    }

    if !report.health_risks.is_empty() {
        let _ = writeln!(md, "## Health Risks\n");
        for r in &report.health_risks {
            let _ = write!(md, "- **{}** ({})", text(&r.risk), r.level.as_str());
            if !r.description.is_empty() {
                let _ = write!(md, ": {}", text(&r.description));
            }
            md.push('\n');
        }
        md.push('\n');
    }

    if !report.recommendations.is_empty() {
        let _ = writeln!(md, "## Recommendations\n");
        for (i, rec) in report.recommendations.iter().enumerate() {
            let _ = writeln!(md, "{}. {}", i + 1, text(rec));
        }
        md.push('\n');
    }

    md
}

fn table_cell(s: &str) -> String {
    let cleaned = s.replace('|', "\\|").replace(['\n', '\r'], " ");
    if cleaned.trim().is_empty() {
        "-".to_string()
    } else {
        cleaned
    }
}
