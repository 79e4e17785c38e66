use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod debounce;
pub mod watcher;

pub use debounce::DebounceTimer;
pub use watcher::{Directive, FocusWatcher, HostSignal, DEFAULT_DEBOUNCE};

/// Browser tab identifier
pub type TabId = i64;

/// Browser window identifier
pub type WindowId = i64;

/// Window id browsers report when no browser window has focus
pub const WINDOW_ID_NONE: WindowId = -1;

/// Tab information reported by the host browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    #[serde(default)]
    pub window_id: Option<WindowId>,
    /// Empty when the browser withholds the URL
    #[serde(default)]
    pub url: String,
}

impl Tab {
    #[must_use]
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id,
            window_id: None,
            url: url.into(),
        }
    }
}

/// Query access to the host's tab state
#[async_trait]
pub trait TabObserver: Send + Sync {
    /// Get the active tab of `window`, or of the last focused window when `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be reached or answers with a malformed reply
    async fn active_tab(&self, window: Option<WindowId>) -> Result<Option<Tab>>;
}
