/// Data export command handlers
use anyhow::{Context, Result};
use clap::ValueEnum;
use footprint_storage::Event;
use std::fmt::Write;

use super::helpers::{escape_csv, open_event_store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

fn events_to_csv(events: &[Event]) -> String {
    let mut csv_content = String::from("type,url,ts,duration,clicks,keys,scrolls\n");

    for event in events {
        let (duration, counters) = match event {
            Event::SessionStart { .. } => (None, None),
            Event::SessionEnd { duration, .. } => (Some(*duration), None),
            Event::Engagement { data, .. } => (None, Some(*data)),
        };
        let _ = writeln!(
            csv_content,
            "{},{},{},{},{},{},{}",
            event.kind(),
            escape_csv(event.url()),
            event.timestamp(),
            duration.map(|d| d.to_string()).unwrap_or_default(),
            counters.map(|c| c.clicks.to_string()).unwrap_or_default(),
            counters.map(|c| c.keys.to_string()).unwrap_or_default(),
            counters.map(|c| c.scrolls.to_string()).unwrap_or_default(),
        );
    }
    csv_content
}

fn render(events: &[Event], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(events)?),
        ExportFormat::Csv => Ok(events_to_csv(events)),
    }
}

pub async fn handle_data_export(format: ExportFormat, output: Option<String>) -> Result<()> {
    let store = open_event_store()?;
    if store.is_empty().await? {
        println!("No events to export");
        return Ok(());
    }
    let events = store.read_all().await?;

    let output_path = output.unwrap_or_else(|| format!("footprint_export.{}", format.extension()));
    std::fs::write(&output_path, render(&events, format)?)
        .with_context(|| format!("Failed to write {output_path}"))?;
    println!("Exported {} events to {output_path}", events.len());

    Ok(())
}
