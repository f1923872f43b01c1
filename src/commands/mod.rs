/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `consult`: interactive wizard followed by the chat REPL
- `analyze`: one-shot skin analysis of an image file
- `diary`: skin diary listing and entry creation
- `backend`: plain lookups (weather, personas, cities, health)

Handlers are thin: they wire configuration into the library components
and render results.
*/

use std::sync::Arc;

use crate::api::ApiClient;
use crate::capture::{CapturePipeline, DeviceCapabilities};
use crate::config::Config;
use crate::error::Result;
use crate::profile::Analyzer;

pub mod analyze;
pub mod consult;
pub mod diary;

/// Backend client from configuration
pub(crate) fn client(config: &Config) -> Result<Arc<ApiClient>> {
    Ok(Arc::new(ApiClient::new(&config.api)?))
}

/// File-mode capture pipeline; terminals have no camera feed
pub(crate) fn pipeline(
    config: &Config,
    client: Arc<ApiClient>,
    analyzer: Option<Analyzer>,
) -> CapturePipeline {
    CapturePipeline::new(
        client,
        analyzer.unwrap_or(config.session.analyzer),
        config.capture.clone(),
        DeviceCapabilities::default(),
    )
}

// Plain backend lookups
pub mod backend {
    //! One-shot backend lookups printed to stdout.

    use super::*;
    use crate::api::{Season, WeatherApi, WeatherQuery};
    use colored::Colorize;

    /// Print weather for a position, a city, or the backend default
    pub async fn run_weather(
        config: Config,
        lat: Option<f64>,
        lon: Option<f64>,
        city: Option<String>,
        season: Option<Season>,
    ) -> Result<()> {
        let client = client(&config)?;
        let query = match (lat, lon, city) {
            (Some(lat), Some(lon), _) => WeatherQuery::coordinates(lat, lon),
            (_, _, Some(city)) => WeatherQuery {
                city: Some(city),
                season,
                ..WeatherQuery::default()
            },
            _ => WeatherQuery::default(),
        };
        let weather = client.get_weather(&query).await?;
        println!("{}", serde_json::to_string_pretty(&weather)?);
        Ok(())
    }

    /// List personas for the configured language
    pub async fn run_personas(config: Config) -> Result<()> {
        let client = client(&config)?;
        let personas = client.get_personas(config.session.language).await?;
        if personas.is_empty() {
            println!("No personas available");
            return Ok(());
        }
        for persona in personas {
            println!(
                "{} {} {} {}",
                persona.emoji,
                persona.name.bold(),
                format!("({})", persona.id).dimmed(),
                persona.subtitle
            );
            if !persona.specialty_tags.is_empty() {
                println!("    {}", persona.specialty_tags.join(", ").cyan());
            }
        }
        Ok(())
    }

    /// List cities known to the backend
    pub async fn run_cities(config: Config) -> Result<()> {
        let client = client(&config)?;
        let cities = client.get_cities(config.session.language).await?;
        for city in cities {
            println!(
                "{:<12} {} {}",
                city.id.cyan(),
                city.name,
                format!("({:.2}, {:.2})", city.lat, city.lon).dimmed()
            );
        }
        Ok(())
    }

    /// Report backend health
    pub async fn run_health(config: Config) -> Result<()> {
        let client = client(&config)?;
        match client.health_check().await {
            Ok(health) => {
                println!("{} {} ({})", "✓".green(), client.base_url(), health.status);
                Ok(())
            }
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), client.base_url(), e);
                Err(e)
            }
        }
    }
}
