//! `sil analyze`: file-mode capture and analysis

use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use super::{client, pipeline};
use crate::capture::{AnalysisSource, CaptureOutcome, ImageFile};
use crate::config::Config;
use crate::error::Result;
use crate::profile::{Analyzer, SkinAnalysis};

/// JSON printed by the command
#[derive(Debug, Serialize)]
struct AnalyzeReport<'a> {
    fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    analysis: &'a SkinAnalysis,
}

impl<'a> From<&'a CaptureOutcome> for AnalyzeReport<'a> {
    fn from(outcome: &'a CaptureOutcome) -> Self {
        let reason = match &outcome.source {
            AnalysisSource::Backend => None,
            AnalysisSource::Fallback { reason } => Some(reason.as_str()),
        };
        Self {
            fallback: outcome.is_fallback(),
            reason,
            analysis: &outcome.analysis,
        }
    }
}

/// Analyze `path`, printing the result (or the fallback) as JSON
///
/// # Errors
///
/// Fails only for unreadable, oversized, or non-image files.
pub async fn run_analyze(config: Config, path: &Path, analyzer: Option<Analyzer>) -> Result<()> {
    let pipeline = pipeline(&config, client(&config)?, analyzer);
    let file = ImageFile::from_path(path).await?;
    tracing::info!(file = %file.name, analyzer = %pipeline.analyzer(), "Analyzing photo");

    let outcome = pipeline.analyze_file(&file).await?;
    if outcome.is_fallback() {
        eprintln!("{}", config.session.language.t("skin_fallback").yellow());
    }
    let report = AnalyzeReport::from(&outcome);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
