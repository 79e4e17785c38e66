//! First-time setup: data directory, default config and persisted state

use anyhow::{Context, Result};
use footprint_core::Config;
use footprint_storage::{Database, SettingsStore};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Write the default config unless one exists; returns whether it was written
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create data directory")?;
    }
    fs::write(path, Config::default().to_toml_string()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Initialize footprint
///
/// # Errors
///
/// Returns an error if the data directory, config file, or database cannot be created
pub async fn init_command() -> Result<()> {
    println!("Initializing Footprint...\n");

    println!("Step 1/2: Configuration");
    println!("{}", "-".repeat(40));
    let config_path = Config::default_path()?;
    if write_default_config(&config_path)? {
        println!("Wrote default config to {}", config_path.display());
    } else {
        println!("Config already exists at {}", config_path.display());
    }

    println!("\nStep 2/2: Database Setup");
    println!("{}", "-".repeat(40));
    let db = Arc::new(Database::new(None)?);
    SettingsStore::new(db).initialize().await?;
    println!("Database ready at {}", Database::default_db_path().display());

    println!("\n========================================");
    println!("  Setup Complete!");
    println!("========================================");
    println!("\nRegister the host with: footprint manifest --extension-id <id>");

    Ok(())
}
