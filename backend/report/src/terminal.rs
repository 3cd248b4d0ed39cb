//! Terminal rendering: ANSI styling, tables, and the severity bar.

use plastiscan_core::{AnalysisOutcome, Likelihood, SeverityLevel};

use crate::markdown::severity_gauge;

// ---------------------------------------------------------------------------
// ANSI Color/Style helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
        && std::env::var("TERM").map(|t| t != "dumb").unwrap_or(true)
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Model text with control characters removed, so it cannot emit escape
/// sequences of its own. Line breaks and tabs become spaces.
pub fn clean(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

struct Style {
    color: bool,
}

impl Style {
    fn paint(&self, codes: &str, s: &str) -> String {
        if self.color {
            format!("{codes}{s}{RESET}")
        } else {
            s.to_string()
        }
    }
}

fn level_color(level: SeverityLevel) -> &'static str {
    match level {
        SeverityLevel::Low => GREEN,
        SeverityLevel::Moderate => YELLOW,
        SeverityLevel::High => MAGENTA,
        SeverityLevel::Critical => RED,
    }
}

fn likelihood_color(l: Likelihood) -> &'static str {
    match l {
        Likelihood::High => RED,
        Likelihood::Medium => YELLOW,
        Likelihood::Low => GREEN,
        Likelihood::Unknown => DIM,
    }
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

pub enum Align {
    Left,
    Right,
}

pub struct Column {
    pub header: String,
    pub align: Align,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Left }
    }
    pub fn right(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Right }
    }
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

/// Render a table with given columns and rows.
pub fn render_table(columns: &[Column], rows: &[Vec<String>], bold_header: bool) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| visible_width(&c.header)).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(visible_width(cell));
        }
    }

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| pad_cell(&col.header, *w, &col.align))
        .collect();
    if bold_header {
        out.push_str(&format!("  {BOLD}{}{RESET}\n", header.join("  ")));
    } else {
        out.push_str(&format!("  {}\n", header.join("  ")));
    }

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (col, w))| pad_cell(row.get(i).map(String::as_str).unwrap_or(""), *w, &col.align))
            .collect();
        out.push_str(&format!("  {}\n", cells.join("  ")));
    }
    out
}

fn pad_cell(s: &str, width: usize, align: &Align) -> String {
    let pad = " ".repeat(width.saturating_sub(visible_width(s)));
    match align {
        Align::Left => format!("{s}{pad}"),
        Align::Right => format!("{pad}{s}"),
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Terminal rendering, colored unless `NO_COLOR` is set or the terminal is dumb.
pub fn to_ansi(outcome: &AnalysisOutcome) -> String {
    to_ansi_with(outcome, supports_color())
}

pub fn to_ansi_with(outcome: &AnalysisOutcome, color: bool) -> String {
    let st = Style { color };
    let report = &outcome.report;
    let level = outcome.severity_level;
    let mut out = String::new();

    out.push_str(&st.paint(BOLD, "Microplastic Analysis Report"));
    out.push('\n');
    out.push_str(&st.paint(
        DIM,
        &format!(
            "{} · {} · {}/{} · {} image(s) · {} ms",
            outcome.id,
            outcome.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            clean(&outcome.provider),
            clean(&outcome.model),
            outcome.image_count,
            outcome.latency_ms
        ),
    ));
    out.push_str("\n\n");

    out.push_str(&format!("{}\n", clean(&report.sample_summary)));
    out.push_str(&format!(
        "Particles: {}",
        st.paint(BOLD, &report.estimated_particle_count.to_string())
    ));
    if !report.particle_density.is_empty() {
        out.push_str(&format!("  Density: {}", clean(&report.particle_density)));
    }
    if let Some(c) = report.confidence {
        out.push_str(&format!("  Confidence: {:.0}%", c * 100.0));
    }
    out.push_str("\n\n");

    let paint = level_color(level);
    out.push_str(&format!(
        "Severity {} {}\n",
        st.paint(paint, &severity_gauge(report.severity_score)),
        st.paint(
            &format!("{BOLD}{paint}"),
            &format!("{}/10 {}", report.severity_score, level.label())
        )
    ));
    if !report.severity_rationale.is_empty() {
        out.push_str(&st.paint(DIM, &clean(&report.severity_rationale)));
        out.push('\n');
    }

    if !report.particles.is_empty() {
        out.push('\n');
        let columns = [
            Column::left("Shape"),
            Column::left("Polymer"),
            Column::right("Count"),
            Column::left("Size"),
            Column::left("Color"),
            Column::right("Share"),
        ];
        let rows: Vec<Vec<String>> = report
            .particles
            .iter()
            .map(|p| {
                vec![
                    p.shape.as_str().to_string(),
                    clean(&p.polymer),
                    p.count.to_string(),
                    clean(&p.size_range),
                    clean(&p.color),
                    format!("{:.1}%", p.percentage),
                ]
            })
            .collect();
        out.push_str(&render_table(&columns, &rows, color));
    }

    if !report.sources.is_empty() {
        out.push('\n');
        out.push_str(&st.paint(&format!("{BOLD}{CYAN}"), "Likely sources"));
        out.push('\n');
        for s in &report.sources {
            out.push_str(&format!(
                "  • {} [{}]",
                clean(&s.source),
                st.paint(likelihood_color(s.likelihood), s.likelihood.as_str())
            ));
            if !s.evidence.is_empty() {
                out.push_str(&format!(" {}", st.paint(DIM, &clean(&s.evidence))));
            }
            out.push('\n');
        }
    }

    if !report.health_risks.is_empty() {
        out.push('\n');
        out.push_str(&st.paint(&format!("{BOLD}{CYAN}"), "Health risks"));
        out.push('\n');
        for r in &report.health_risks {
            out.push_str(&format!(
                "  • {} [{}]",
                clean(&r.risk),
                st.paint(likelihood_color(r.level), r.level.as_str())
            ));
            if !r.description.is_empty() {
                out.push_str(&format!(" {}", st.paint(DIM, &clean(&r.description))));
            }
            out.push('\n');
        }
    }

    if !report.recommendations.is_empty() {
        out.push('\n');
        out.push_str(&st.paint(&format!("{BOLD}{CYAN}"), "Recommendations"));
        out.push('\n');
        for (i, rec) in report.recommendations.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, clean(rec)));
        }
    }

    out
}
