mod analyze_cmd;
mod config_cmd;
mod doctor_cmd;
mod notes;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use plastiscan_config::{load_and_prepare, resolve_config_path, Settings};
use plastiscan_gateway::{start_server, GatewayState};
use plastiscan_logging::init_logger;

use analyze_cmd::OutputFormat;

#[derive(Parser)]
#[command(name = "plastiscan")]
#[command(about = "Plastiscan: AI-assisted microplastic analysis of water-sample images")]
#[command(version)]
struct Cli {
    /// Path to config.yaml (defaults to $PLASTISCAN_CONFIG or ~/.plastiscan/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web upload form and analysis API
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Analyze one sample from image files and print the report
    Analyze {
        /// Microscope images of the filtered sample
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Free-text sample context (location, filtered volume, ...)
        #[arg(short, long)]
        notes: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
        format: OutputFormat,
        /// Write the rendering to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Check configuration, credentials, and provider reachability
    Doctor,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Print the resolved config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Config { action: ConfigAction::Path } => {
            config_cmd::path(&config_path);
            return Ok(());
        }
        Commands::Doctor => {
            let healthy = doctor_cmd::run(&config_path).await?;
            if !healthy {
                std::process::exit(1);
            }
            return Ok(());
        }
        _ => {}
    }

    let (config, warnings) = load_and_prepare(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let mut settings = Settings::from_config(&config);

    init_logger(&settings.log_dir, &settings.log_level, settings.log_json);
    for warning in warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }

    match cli.command {
        Commands::Serve { port, bind } => {
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(bind) = bind {
                settings.bind = bind;
            }
            run_server(&settings).await?;
        }
        Commands::Analyze { images, notes, format, out } => {
            analyze_cmd::run(&settings, &images, notes.as_deref(), format, out.as_deref()).await?;
        }
        Commands::Config { action: ConfigAction::Show } => {
            config_cmd::show(&config)?;
        }
        Commands::Config { action: ConfigAction::Path } | Commands::Doctor => {}
    }

    Ok(())
}

async fn run_server(settings: &Settings) -> Result<()> {
    let addr = settings.socket_addr()?;
    info!(
        addr = %addr,
        provider = %settings.provider,
        model = %settings.model,
        max_images = settings.max_images,
        "Starting Plastiscan"
    );
    let state = GatewayState::from_settings(settings)?;
    start_server(addr, state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analyze_with_options() {
        let cli = Cli::try_parse_from([
            "plastiscan", "--config", "custom.yaml", "analyze", "a.png", "b.jpg",
            "--notes", "river", "--format", "json", "--out", "report.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        match cli.command {
            Commands::Analyze { images, notes, format, out } => {
                assert_eq!(images.len(), 2);
                assert_eq!(notes.as_deref(), Some("river"));
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(out, Some(PathBuf::from("report.json")));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn analyze_requires_images() {
        assert!(Cli::try_parse_from(["plastiscan", "analyze"]).is_err());
    }

    #[test]
    fn parses_serve_and_config_subcommands() {
        let cli = Cli::try_parse_from(["plastiscan", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000), bind: None }));

        let cli = Cli::try_parse_from(["plastiscan", "config", "show"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { action: ConfigAction::Show }));
    }
}
