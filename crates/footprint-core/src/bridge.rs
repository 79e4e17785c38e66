use async_trait::async_trait;
use footprint_storage::EngagementCounters;
use serde::{Deserialize, Serialize};

use crate::monitor::TabId;

/// Page text cap applied by the in-page agent; re-applied on receipt
pub const MAX_PAGE_TEXT_CHARS: usize = 50_000;

/// Reply of the in-page agent to `request_full_text`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub text: String,
    /// Counters accumulated since the previous read; the agent resets them on reply
    #[serde(default)]
    pub engagement: EngagementCounters,
}

impl PageSnapshot {
    /// Clamp the text to [`MAX_PAGE_TEXT_CHARS`] characters
    #[must_use]
    pub fn truncated(mut self) -> Self {
        if let Some((byte_idx, _)) = self.text.char_indices().nth(MAX_PAGE_TEXT_CHARS) {
            self.text.truncate(byte_idx);
        }
        self
    }
}

/// Request/response channel to the in-page content agent
#[async_trait]
pub trait AgentBridge: Send + Sync {
    /// Ask the agent in `tab_id` for its page text and engagement counters.
    ///
    /// Never fails: an unreachable or silent agent yields an empty snapshot.
    async fn request_full_text(&self, tab_id: TabId) -> PageSnapshot;
}
