/// Event log listing
use anyhow::Result;
use footprint_storage::{Clock, Event, EventKind, SystemClock};
use tabled::{Table, Tabled};

use super::helpers::{event_details, format_timestamp, open_event_store, truncate_str};

const URL_WIDTH: usize = 60;
const HOUR_MS: i64 = 3_600_000;

/// Earliest timestamp still inside the last `hours`
fn since_cutoff(now_ms: i64, hours: u32) -> i64 {
    now_ms - i64::from(hours) * HOUR_MS
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Details")]
    details: String,
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        Self {
            time: format_timestamp(event.timestamp()),
            kind: event.kind().as_str(),
            url: truncate_str(event.url(), URL_WIDTH),
            details: event_details(event),
        }
    }
}

/// Keep events of `kind` (all when `None`), then the newest `limit`
fn select_events(events: Vec<Event>, kind: Option<EventKind>, limit: Option<usize>) -> Vec<Event> {
    let mut selected: Vec<Event> = events
        .into_iter()
        .filter(|e| match kind {
            Some(k) => e.kind() == k,
            None => true,
        })
        .collect();
    if let Some(limit) = limit {
        let skip = selected.len().saturating_sub(limit);
        selected.drain(..skip);
    }
    selected
}

pub async fn handle_events(
    kind: Option<String>,
    since_hours: Option<u32>,
    limit: Option<usize>,
) -> Result<()> {
    let kind = kind.map(|k| k.parse::<EventKind>()).transpose()?;
    let store = open_event_store()?;
    let stored = match since_hours {
        Some(hours) => {
            store
                .read_since(since_cutoff(SystemClock.now_ms(), hours))
                .await?
        }
        None => store.read_all().await?,
    };
    let events = select_events(stored, kind, limit);

    if events.is_empty() {
        println!("No events recorded");
        return Ok(());
    }

    let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();
    println!("{}", Table::new(rows));
    println!("{} event(s)", events.len());
    Ok(())
}
