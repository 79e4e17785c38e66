use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Summary of one finished browsing session sent to the collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub url: String,
    /// Epoch milliseconds
    pub start_time: i64,
    /// Epoch milliseconds
    pub end_time: i64,
    /// Milliseconds
    pub duration: i64,
}

/// Page text captured for a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub url: String,
    pub html: String,
}

/// Outbound delivery of summaries to the remote collector.
///
/// Delivery is best-effort: callers log failures and move on, nothing is retried.
#[async_trait]
pub trait Uplink: Send + Sync {
    /// Deliver a session summary
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the collector rejects it
    async fn send_session(&self, summary: &SessionSummary) -> Result<()>;

    /// Deliver a page-content summary
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the collector rejects it
    async fn send_content(&self, summary: &ContentSummary) -> Result<()>;

    /// Get the uplink name (for logs)
    #[must_use]
    fn name(&self) -> &'static str;
}

impl SessionSummary {
    #[must_use]
    pub fn new(url: impl Into<String>, start_time: i64, end_time: i64) -> Self {
        Self {
            url: url.into(),
            start_time,
            end_time,
            duration: end_time - start_time,
        }
    }
}

impl ContentSummary {
    #[must_use]
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}
