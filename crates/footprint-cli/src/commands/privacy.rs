/// Privacy settings command handlers
use anyhow::Result;
use clap::ValueEnum;
use footprint_storage::{Database, Settings, SettingsStore};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// Privacy action types
pub enum PrivacyActionType {
    Exclude { pattern: String },
    Include { pattern: String },
    ContentScanning(Toggle),
}

/// Add `pattern` to the exclude list; `false` if it was already there
fn add_exclusion(settings: &mut Settings, pattern: &str) -> bool {
    if settings.exclude_list.iter().any(|p| p == pattern) {
        return false;
    }
    settings.exclude_list.push(pattern.to_string());
    true
}

/// Remove `pattern` from the exclude list; `false` if it was not there
fn remove_exclusion(settings: &mut Settings, pattern: &str) -> bool {
    let before = settings.exclude_list.len();
    settings.exclude_list.retain(|p| p != pattern);
    settings.exclude_list.len() != before
}

fn print_settings(settings: &Settings) {
    println!("Privacy Settings");
    println!("\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}");
    println!(
        "Content scanning: {}",
        if settings.content_scanning {
            "ON"
        } else {
            "OFF"
        }
    );
    if settings.exclude_list.is_empty() {
        println!("Excluded URLs: none");
    } else {
        println!("Excluded URLs (substring match):");
        for pattern in &settings.exclude_list {
            println!("  - {pattern}");
        }
    }
}

pub async fn handle_privacy_command(action: Option<PrivacyActionType>) -> Result<()> {
    let store = SettingsStore::new(Arc::new(Database::new(None)?));
    let mut settings = store.load().await?;

    match action {
        Some(PrivacyActionType::Exclude { pattern }) => {
            if pattern.is_empty() {
                anyhow::bail!("Exclude pattern must not be empty");
            }
            if add_exclusion(&mut settings, &pattern) {
                store.save(&settings).await?;
                println!("Added '{pattern}' to exclusion list");
            } else {
                println!("'{pattern}' already in exclusion list");
            }
        }
        Some(PrivacyActionType::Include { pattern }) => {
            if remove_exclusion(&mut settings, &pattern) {
                store.save(&settings).await?;
                println!("Removed '{pattern}' from exclusion list");
            } else {
                println!("'{pattern}' is not in the exclusion list");
            }
        }
        Some(PrivacyActionType::ContentScanning(toggle)) => {
            settings.content_scanning = toggle == Toggle::On;
            store.save(&settings).await?;
            println!(
                "Content scanning {}",
                if settings.content_scanning {
                    "enabled"
                } else {
                    "disabled"
                }
            );
        }
        None => print_settings(&settings),
    }

    Ok(())
}
