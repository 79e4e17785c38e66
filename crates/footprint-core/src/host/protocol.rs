//! Message shapes exchanged with the extension shim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::monitor::{Tab, TabId, WindowId, WINDOW_ID_NONE};

/// Frame sent by the shim
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    TabActivated {
        tab: Tab,
    },
    WindowFocusChanged {
        #[serde(rename = "windowId", default)]
        window_id: Option<WindowId>,
    },
    TabUpdated {
        tab: Tab,
    },
    /// Runtime message expecting a [`OutboundFrame::Response`] with the same id
    Message {
        id: u64,
        #[serde(default)]
        sender: MessageSender,
        #[serde(default)]
        payload: Value,
    },
    /// Answer to an [`OutboundFrame::Request`]
    Reply {
        #[serde(rename = "requestId")]
        request_id: Uuid,
        #[serde(default)]
        payload: Value,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageSender {
    #[serde(default)]
    pub url: Option<String>,
}

/// Frame sent to the shim
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Response {
        id: u64,
        payload: Value,
    },
    Request {
        #[serde(rename = "requestId")]
        request_id: Uuid,
        request: HostRequest,
    },
}

/// Work the shim performs on the host's behalf
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostRequest {
    /// Inject the content agent if needed and ask it for page text and counters
    RequestFullText {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    /// Active tab of a window, or of the last focused window
    QueryActiveTab {
        #[serde(rename = "windowId", skip_serializing_if = "Option::is_none")]
        window_id: Option<WindowId>,
    },
}

/// Reply payload to [`HostRequest::QueryActiveTab`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ActiveTabReply {
    #[serde(default)]
    pub tab: Option<Tab>,
}

/// Browsers report "no focused window" as a sentinel id
#[must_use]
pub fn focused_window(window_id: Option<WindowId>) -> Option<WindowId> {
    window_id.filter(|&id| id != WINDOW_ID_NONE)
}
