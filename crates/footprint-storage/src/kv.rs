//! Key-value persistence capability.
//!
//! The tracker only ever needs a process-wide map from a handful of string keys
//! (`events`, `settings`) to JSON documents. [`Database`](crate::Database) backs it with
//! SQLite; [`MemoryStorage`] backs tests and dry runs.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Key under which the ordered event log is stored
pub const EVENTS_KEY: &str = "events";
/// Key under which user settings are stored
pub const SETTINGS_KEY: &str = "settings";

/// Persistent key-value store
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the document stored under `key`, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read or holds invalid JSON
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the document stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// In-memory storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
