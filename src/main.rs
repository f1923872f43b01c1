//! SIL - K-Beauty skin consultation CLI
//!
#![doc = "SIL - K-Beauty skin consultation CLI"]
#![doc = "Main entry point for the SIL terminal client."]

use anyhow::Result;

use sil_consult::cli::{Cli, Commands};
use sil_consult::commands;
use sil_consult::config::Config;
use sil_consult::logging::{init_logging, LoggingOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_logging(&LoggingOptions::from_flags(cli.verbose, cli.json_logs))?;

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;
    tracing::debug!(base_url = %config.api.base_url, lang = %config.session.language, "Configuration loaded");

    // Execute command
    match cli.command {
        Commands::Consult { skip_setup, photo } => {
            tracing::info!("Starting interactive consultation");
            commands::consult::run_consult(config, skip_setup, photo).await
        }
        Commands::Analyze { path, analyzer } => {
            tracing::info!("Analyzing {}", path.display());
            commands::analyze::run_analyze(config, &path, analyzer).await
        }
        Commands::Weather {
            lat,
            lon,
            city,
            season,
        } => commands::backend::run_weather(config, lat, lon, city, season).await,
        Commands::Personas => commands::backend::run_personas(config).await,
        Commands::Cities => commands::backend::run_cities(config).await,
        Commands::Diary { command } => commands::diary::handle_diary(config, command).await,
        Commands::Health => commands::backend::run_health(config).await,
    }
}
