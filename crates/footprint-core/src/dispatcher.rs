//! Runtime message handling.
//!
//! Messages from the popup and in-page agents arrive as JSON payloads tagged by `type`.
//! Known kinds are turned into tracker operations or event-store writes; anything else
//! is dropped without a response.

use footprint_storage::{Clock, EngagementCounters, Event, EventStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::session_manager::Tracker;

/// Inbound runtime message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    #[serde(rename = "pause")]
    Pause,
    #[serde(rename = "resume")]
    Resume,
    #[serde(rename = "getStatus")]
    GetStatus,
    #[serde(rename = "engagement")]
    Engagement {
        #[serde(default)]
        data: EngagementCounters,
    },
    /// Unsolicited page text, sent once per page load
    #[serde(rename = "page_html")]
    PageHtml {
        #[serde(default)]
        text: String,
    },
}

impl Command {
    /// Decode a payload, `None` for unknown or missing kinds
    #[must_use]
    pub fn parse(payload: &Value) -> Option<Self> {
        match serde_json::from_value(payload.clone()) {
            Ok(command) => Some(command),
            Err(e) => {
                log::debug!("Ignoring runtime message: {e}");
                None
            }
        }
    }
}

/// Response payload sent back to the message sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Status { paused: bool },
    Ack { ok: bool },
}

impl Reply {
    const fn ack() -> Self {
        Self::Ack { ok: true }
    }
}

pub struct Dispatcher {
    store: Arc<EventStore>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(store: Arc<EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Handle a runtime message from `sender_url` (empty when the sender has none)
    pub async fn dispatch(
        &self,
        tracker: &mut Tracker,
        payload: &Value,
        sender_url: Option<&str>,
    ) -> Option<Reply> {
        let command = Command::parse(payload)?;
        let url = sender_url.unwrap_or_default().to_string();

        let reply = match command {
            Command::Pause => {
                tracker.pause().await;
                Reply::Status { paused: true }
            }
            Command::Resume => {
                tracker.resume().await;
                Reply::Status { paused: false }
            }
            Command::GetStatus => Reply::Status {
                paused: tracker.is_paused(),
            },
            Command::Engagement { data } => {
                let event = Event::engagement(url, data, self.clock.now_ms());
                if let Err(e) = self.store.append(event).await {
                    log::warn!("Failed to record engagement: {e:#}");
                }
                Reply::ack()
            }
            Command::PageHtml { text } => {
                tracker.forward_page_content(url, text);
                Reply::ack()
            }
        };
        Some(reply)
    }
}
