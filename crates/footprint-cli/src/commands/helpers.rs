//! Helper utility functions for CLI commands

use anyhow::Result;
use chrono::{DateTime, Local};
use footprint_storage::{Database, Event, EventStore, SystemClock};
use std::sync::Arc;

/// Safely truncate a string to a maximum number of characters (not bytes).
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Escape a string for CSV format
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Render epoch milliseconds in local time
pub fn format_timestamp(ts_ms: i64) -> String {
    DateTime::from_timestamp_millis(ts_ms).map_or_else(
        || ts_ms.to_string(),
        |t| {
            t.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    )
}

/// Render a millisecond duration as `1h 02m 03s`, `2m 03s` or `3s`
pub fn format_duration_ms(ms: i64) -> String {
    let total = ms.max(0) / 1000;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// One-line description of the kind-specific fields of an event
pub fn event_details(event: &Event) -> String {
    match event {
        Event::SessionStart { .. } => String::new(),
        Event::SessionEnd { duration, .. } => format_duration_ms(*duration),
        Event::Engagement { data, .. } => format!(
            "clicks {}, keys {}, scrolls {}",
            data.clicks, data.keys, data.scrolls
        ),
    }
}

/// Open the event log in the default database
pub fn open_event_store() -> Result<EventStore> {
    let db = Arc::new(Database::new(None)?);
    Ok(EventStore::new(db, Arc::new(SystemClock)))
}
