//! Configuration management for SIL
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, SilError};
use crate::language::Language;
use crate::profile::Analyzer;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for SIL
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Consultation defaults
    #[serde(default)]
    pub session: SessionConfig,
    /// Image capture limits
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for plain JSON calls (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Client-side deadline for skin analysis (seconds)
    #[serde(default = "default_analyze_timeout")]
    pub analyze_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_analyze_timeout() -> u64 {
    45
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
            analyze_timeout_seconds: default_analyze_timeout(),
        }
    }
}

/// Consultation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Reply language
    #[serde(default)]
    pub language: Language,

    /// Vision model used for skin scans
    #[serde(default)]
    pub analyzer: Analyzer,

    /// Persona sent with consult requests when none was chosen
    #[serde(default = "default_persona_id")]
    pub default_persona_id: String,
}

fn default_persona_id() -> String {
    "dr_beauty".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            analyzer: Analyzer::default(),
            default_persona_id: default_persona_id(),
        }
    }
}

/// Image capture limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Largest accepted upload (bytes)
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// JPEG quality for encoded captures (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Longest edge of the encoded image (pixels)
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_max_dimension() -> u32 {
    1600
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            jpeg_quality: default_jpeg_quality(),
            max_dimension: default_max_dimension(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed command line, for overrides
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SilError::Config(format!("Failed to read {}: {}", path, e)))?;
        let config: Config = serde_yaml::from_str(&contents).map_err(SilError::from)?;
        tracing::debug!("Loaded configuration from {}", path);
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("SIL_API_URL") {
            if !base_url.trim().is_empty() {
                tracing::debug!(base_url = %base_url, "Env override: SIL_API_URL");
                self.api.base_url = base_url;
            }
        }

        if let Ok(lang) = std::env::var("SIL_LANGUAGE") {
            match lang.parse::<Language>() {
                Ok(v) => self.session.language = v,
                Err(_) => tracing::warn!("Invalid SIL_LANGUAGE: {}", lang),
            }
        }

        if let Ok(analyzer) = std::env::var("SIL_ANALYZER") {
            match analyzer.parse::<Analyzer>() {
                Ok(v) => self.session.analyzer = v,
                Err(_) => tracing::warn!("Invalid SIL_ANALYZER: {}", analyzer),
            }
        }

        if let Ok(persona) = std::env::var("SIL_PERSONA") {
            self.session.default_persona_id = persona;
        }

        if let Ok(timeout) = std::env::var("SIL_ANALYZE_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.analyze_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid SIL_ANALYZE_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(lang) = cli.lang {
            self.session.language = lang;
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| {
            SilError::Config(format!("Invalid api.base_url {}: {}", self.api.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SilError::Config(format!(
                "api.base_url must use http or https, got {}",
                url.scheme()
            ))
            .into());
        }

        if self.api.request_timeout_seconds == 0 {
            return Err(SilError::Config(
                "api.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.api.analyze_timeout_seconds == 0 {
            return Err(SilError::Config(
                "api.analyze_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.default_persona_id.trim().is_empty() {
            return Err(SilError::Config(
                "session.default_persona_id cannot be empty".to_string(),
            )
            .into());
        }

        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err(SilError::Config(
                "capture.jpeg_quality must be between 1 and 100".to_string(),
            )
            .into());
        }

        if self.capture.max_file_bytes == 0 {
            return Err(SilError::Config(
                "capture.max_file_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        if self.capture.max_dimension == 0 {
            return Err(SilError::Config(
                "capture.max_dimension must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
