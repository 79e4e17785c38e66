//! Append-only event log with a rolling retention window.

use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::kv::{Storage, EVENTS_KEY};
use crate::models::Event;

/// Default retention horizon
pub const DEFAULT_RETENTION_DAYS: u32 = 14;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Local event log persisted under the `events` key.
///
/// Eviction is lazy: stale entries are dropped only when a new event is appended.
/// Appends are serialized through an async mutex so the load-filter-append-persist
/// sequence of one append never interleaves with another.
pub struct EventStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    retention_ms: i64,
    write_lock: Mutex<()>,
}

impl EventStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self::with_retention_days(storage, clock, DEFAULT_RETENTION_DAYS)
    }

    #[must_use]
    pub fn with_retention_days(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        retention_days: u32,
    ) -> Self {
        Self {
            storage,
            clock,
            retention_ms: i64::from(retention_days) * MS_PER_DAY,
            write_lock: Mutex::new(()),
        }
    }

    /// Oldest timestamp an event may carry and still be kept
    #[must_use]
    pub fn retention_cutoff(&self) -> i64 {
        self.clock.now_ms() - self.retention_ms
    }

    /// Append an event, evicting everything older than the retention window
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or written
    pub async fn append(&self, event: Event) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let cutoff = self.retention_cutoff();
        let mut events = self.load().await?;
        let before = events.len();
        events.retain(|e| e.timestamp() >= cutoff);
        let evicted = before - events.len();
        if evicted > 0 {
            log::debug!("Evicted {evicted} events older than retention cutoff {cutoff}");
        }

        log::debug!("Appending {} event for {}", event.kind(), event.url());
        events.push(event);

        let value = serde_json::to_value(&events)?;
        self.storage
            .set(EVENTS_KEY, value)
            .await
            .context("Failed to persist events")
    }

    /// All stored events in insertion order
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read
    pub async fn read_all(&self) -> Result<Vec<Event>> {
        self.load().await
    }

    /// Stored events recorded at or after `since_ms`
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read
    pub async fn read_since(&self, since_ms: i64) -> Result<Vec<Event>> {
        let mut events = self.load().await?;
        events.retain(|e| e.timestamp() >= since_ms);
        Ok(events)
    }

    /// Number of stored events
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read
    pub async fn len(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    /// Check whether the log is empty
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    async fn load(&self) -> Result<Vec<Event>> {
        let Some(value) = self.storage.get(EVENTS_KEY).await? else {
            return Ok(Vec::new());
        };

        let Value::Array(entries) = value else {
            log::warn!("Stored events are not a list, starting a fresh log");
            return Ok(Vec::new());
        };

        let mut events = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<Event>(entry) {
                Ok(event) => events.push(event),
                Err(e) => log::warn!("Skipping undecodable stored event: {e}"),
            }
        }
        Ok(events)
    }
}
