//! Tracing subscriber setup
//!
//! Logs go to stderr so they never interleave with streamed replies on
//! stdout. `RUST_LOG` takes precedence over the level chosen here.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How logs are rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// JSON lines instead of human-readable output
    pub json_format: bool,
}

impl LoggingOptions {
    /// Options derived from the `--verbose` and `--json-logs` flags
    ///
    /// # Examples
    ///
    /// ```
    /// use sil_consult::logging::LoggingOptions;
    ///
    /// assert_eq!(LoggingOptions::from_flags(true, false).level, "sil_consult=debug");
    /// assert_eq!(LoggingOptions::from_flags(false, true).level, "sil_consult=info");
    /// ```
    pub fn from_flags(verbose: bool, json_format: bool) -> Self {
        let level = if verbose {
            "sil_consult=debug"
        } else {
            "sil_consult=info"
        };
        Self {
            level: level.to_string(),
            json_format,
        }
    }
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails on an invalid filter directive or when a subscriber is already set.
pub fn init_logging(options: &LoggingOptions) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&options.level))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if options.json_format {
        let layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr);
        registry.with(layer).try_init()?;
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr);
        registry.with(layer).try_init()?;
    }

    Ok(())
}
