//! Command-line interface definition for SIL
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive consultation and one-shot backend commands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::Season;
use crate::language::Language;
use crate::profile::Analyzer;

/// SIL - K-Beauty skin consultation client
///
/// Walks through the five-vector setup and chats with a skincare expert
/// served by the SIL backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "sil")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Reply language (ko, en, ja)
    #[arg(short, long)]
    pub lang: Option<Language>,

    /// Backend base URL
    #[arg(long, env = "SIL_API_URL")]
    pub api_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for SIL
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the interactive consultation wizard and chat
    Consult {
        /// Go straight to chat without the five-vector setup
        #[arg(long)]
        skip_setup: bool,

        /// Photo to use for the skin scan step
        #[arg(short, long)]
        photo: Option<PathBuf>,
    },

    /// Analyze a skin photo and print the result as JSON
    Analyze {
        /// Image file to analyze
        path: PathBuf,

        /// Vision model (claude_vision, facepp, both)
        #[arg(short, long)]
        analyzer: Option<Analyzer>,
    },

    /// Show weather for a position or a city
    Weather {
        #[arg(long, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, requires = "lat")]
        lon: Option<f64>,

        /// City id (see `sil cities`)
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        /// Season for city lookups (spring, summer, fall, winter)
        #[arg(long, requires = "city")]
        season: Option<Season>,
    },

    /// List consultation personas
    Personas,

    /// List cities known to the backend
    Cities,

    /// Read or add skin diary entries
    Diary {
        #[command(subcommand)]
        command: DiaryCommand,
    },

    /// Check that the backend is reachable
    Health,
}

/// Skin diary subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DiaryCommand {
    /// List stored entries
    List,

    /// Record today's skin state
    Add {
        /// Free-text notes
        #[arg(short, long)]
        notes: String,

        /// Photo to analyze for the entry
        #[arg(short, long)]
        photo: Option<PathBuf>,

        /// City id for the weather snapshot
        #[arg(long)]
        city: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            lang: None,
            api_url: None,
            command: Commands::Health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Health));
    }

    #[test]
    fn test_cli_parse_consult() {
        let cli = Cli::try_parse_from(["sil", "--lang", "en", "consult", "--skip-setup"]).unwrap();
        assert_eq!(cli.lang, Some(Language::En));
        if let Commands::Consult { skip_setup, photo } = cli.command {
            assert!(skip_setup);
            assert!(photo.is_none());
        } else {
            panic!("Expected Consult command");
        }
    }

    #[test]
    fn test_cli_parse_analyze_with_analyzer() {
        let cli = Cli::try_parse_from(["sil", "analyze", "face.jpg", "--analyzer", "facepp"])
            .unwrap();
        if let Commands::Analyze { path, analyzer } = cli.command {
            assert_eq!(path, PathBuf::from("face.jpg"));
            assert_eq!(analyzer, Some(Analyzer::Facepp));
        } else {
            panic!("Expected Analyze command");
        }
    }

    #[test]
    fn test_cli_parse_weather_city() {
        let cli =
            Cli::try_parse_from(["sil", "weather", "--city", "tokyo", "--season", "fall"]).unwrap();
        if let Commands::Weather { city, season, .. } = cli.command {
            assert_eq!(city.as_deref(), Some("tokyo"));
            assert_eq!(season, Some(Season::Fall));
        } else {
            panic!("Expected Weather command");
        }
    }

    #[test]
    fn test_cli_weather_rejects_mixed_query() {
        let result = Cli::try_parse_from([
            "sil", "weather", "--lat", "1.0", "--lon", "2.0", "--city", "la",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_diary_add() {
        let cli = Cli::try_parse_from(["sil", "diary", "add", "--notes", "calm day"]).unwrap();
        if let Commands::Diary {
            command: DiaryCommand::Add { notes, photo, city },
        } = cli.command
        {
            assert_eq!(notes, "calm day");
            assert!(photo.is_none());
            assert!(city.is_none());
        } else {
            panic!("Expected Diary Add command");
        }
    }

    #[test]
    fn test_cli_rejects_unknown_language() {
        assert!(Cli::try_parse_from(["sil", "--lang", "fr", "health"]).is_err());
    }
}
