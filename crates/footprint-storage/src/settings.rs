use anyhow::{Context, Result};
use std::sync::Arc;

use crate::kv::{Storage, EVENTS_KEY, SETTINGS_KEY};
use crate::models::Settings;

/// Access to the persisted `settings` document.
///
/// Nothing is cached: every [`SettingsStore::load`] reads storage again so that
/// edits made from the CLI apply at the tracker's next decision point.
#[derive(Clone)]
pub struct SettingsStore {
    storage: Arc<dyn Storage>,
}

impl SettingsStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Load settings, falling back to defaults when none are stored
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or the stored document is malformed
    pub async fn load(&self) -> Result<Settings> {
        match self.storage.get(SETTINGS_KEY).await? {
            Some(value) => serde_json::from_value(value).context("Malformed settings document"),
            None => Ok(Settings::default()),
        }
    }

    /// Persist settings
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        let value = serde_json::to_value(settings)?;
        self.storage.set(SETTINGS_KEY, value).await
    }

    /// First-run initialization: create an empty event log and default settings
    /// when they are absent. Existing documents are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written
    pub async fn initialize(&self) -> Result<()> {
        if self.storage.get(EVENTS_KEY).await?.is_none() {
            self.storage
                .set(EVENTS_KEY, serde_json::Value::Array(Vec::new()))
                .await?;
            log::info!("Initialized empty event log");
        }
        if self.storage.get(SETTINGS_KEY).await?.is_none() {
            self.save(&Settings::default()).await?;
            log::info!("Initialized default settings");
        }
        Ok(())
    }
}
