pub mod clock;
pub mod db;
pub mod event_store;
pub mod kv;
pub mod migrations;
pub mod models;
pub mod settings;

pub use clock::{Clock, ManualClock, SystemClock};
pub use db::Database;
pub use event_store::{EventStore, DEFAULT_RETENTION_DAYS};
pub use kv::{MemoryStorage, Storage, EVENTS_KEY, SETTINGS_KEY};
pub use models::{EngagementCounters, Event, EventKind, Settings};
pub use settings::SettingsStore;
