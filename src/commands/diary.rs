//! `sil diary`: skin diary listing and entry creation

use std::path::PathBuf;

use colored::Colorize;

use super::{client, pipeline};
use crate::api::SkinDiaryEntry;
use crate::capture::ImageFile;
use crate::cli::DiaryCommand;
use crate::config::Config;
use crate::error::Result;
use crate::profile::SkinAnalysis;
use crate::session::steps::{resolve_by_city, resolve_default};

/// Dispatch a diary subcommand
pub async fn handle_diary(config: Config, command: DiaryCommand) -> Result<()> {
    match command {
        DiaryCommand::List => list_entries(config).await,
        DiaryCommand::Add { notes, photo, city } => add_entry(config, notes, photo, city).await,
    }
}

async fn list_entries(config: Config) -> Result<()> {
    let entries = client(&config)?.get_diary().await?;
    if entries.is_empty() {
        println!("No diary entries yet");
        return Ok(());
    }
    for entry in entries {
        let issues: Vec<&str> = entry.skin_data.issues.iter().map(|i| i.as_str()).collect();
        println!(
            "{}  {}  {:.0}°C {}  {}",
            entry.date.bold(),
            entry.weather.city.cyan(),
            entry.weather.temp,
            entry.weather.description,
            issues.join(", ").yellow()
        );
        if !entry.notes.is_empty() {
            println!("    {}", entry.notes);
        }
    }
    Ok(())
}

async fn add_entry(
    config: Config,
    notes: String,
    photo: Option<PathBuf>,
    city: Option<String>,
) -> Result<()> {
    let client = client(&config)?;

    let skin_data = match photo {
        Some(path) => {
            let file = ImageFile::from_path(&path).await?;
            let outcome = pipeline(&config, client.clone(), None)
                .analyze_file(&file)
                .await?;
            if outcome.is_fallback() {
                eprintln!("{}", config.session.language.t("skin_fallback").yellow());
            }
            outcome.analysis
        }
        None => SkinAnalysis::default(),
    };

    let weather = match city.as_deref() {
        Some(city) => resolve_by_city(client.as_ref(), city, None).await,
        None => resolve_default(client.as_ref()).await,
    };

    let entry = SkinDiaryEntry {
        date: chrono::Local::now().date_naive().to_string(),
        skin_data,
        weather,
        notes,
        routine_am: None,
        routine_pm: None,
        photo_url: None,
    };
    let stored = client.add_diary_entry(&entry).await?;
    println!("{} {}", "Saved entry for".green(), stored.date.bold());
    Ok(())
}
