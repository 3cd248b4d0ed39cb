//! `plastiscan analyze`: one analysis from image files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::info;

use plastiscan_analysis::Analyzer;
use plastiscan_config::Settings;
use plastiscan_core::AnalysisOutcome;
use plastiscan_imaging::load_image;
use plastiscan_report::{render_dashboard, to_ansi, to_markdown, Thumbnail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
    Markdown,
    Html,
}

pub async fn run(
    settings: &Settings,
    paths: &[PathBuf],
    notes: Option<&str>,
    format: OutputFormat,
    out: Option<&Path>,
) -> Result<()> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        images.push(load_image(path).await?);
    }
    info!(count = images.len(), "Loaded images");

    let thumbnails: Vec<Thumbnail> = if format == OutputFormat::Html {
        images.iter().map(Thumbnail::from_image).collect()
    } else {
        Vec::new()
    };

    let analyzer = Analyzer::from_settings(settings)?;
    let outcome = analyzer.analyze(images, notes).await?;

    let rendered = render(&outcome, format, &thumbnails, out.is_none())?;
    match out {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Terminal output is only colored when it goes to the terminal.
fn render(
    outcome: &AnalysisOutcome,
    format: OutputFormat,
    thumbnails: &[Thumbnail],
    to_stdout: bool,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Terminal if to_stdout => to_ansi(outcome),
        OutputFormat::Terminal => plastiscan_report::to_ansi_with(outcome, false),
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Markdown => to_markdown(outcome),
        OutputFormat::Html => render_dashboard(outcome, thumbnails),
    })
}
