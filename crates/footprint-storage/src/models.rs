use serde::{Deserialize, Serialize};
use std::fmt;

/// Engagement counters reported by the in-page agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounters {
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub keys: u64,
    #[serde(default)]
    pub scrolls: u64,
}

impl EngagementCounters {
    #[must_use]
    pub const fn new(clicks: u64, keys: u64, scrolls: u64) -> Self {
        Self {
            clicks,
            keys,
            scrolls,
        }
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.clicks == 0 && self.keys == 0 && self.scrolls == 0
    }
}

/// Persisted event record.
///
/// The JSON shape (`type`, `url`, `ts`, plus kind-specific fields) matches what the
/// browser build writes, so an exported log can be read by either side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStart {
        url: String,
        ts: i64,
    },
    SessionEnd {
        url: String,
        /// Milliseconds between session start and `ts`
        duration: i64,
        ts: i64,
    },
    Engagement {
        url: String,
        data: EngagementCounters,
        ts: i64,
    },
}

/// Discriminant of [`Event`], used for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStart,
    SessionEnd,
    Engagement,
}

impl Event {
    #[must_use]
    pub fn session_start(url: impl Into<String>, ts: i64) -> Self {
        Self::SessionStart {
            url: url.into(),
            ts,
        }
    }

    #[must_use]
    pub fn session_end(url: impl Into<String>, started_at: i64, ts: i64) -> Self {
        Self::SessionEnd {
            url: url.into(),
            duration: ts - started_at,
            ts,
        }
    }

    #[must_use]
    pub fn engagement(url: impl Into<String>, data: EngagementCounters, ts: i64) -> Self {
        Self::Engagement {
            url: url.into(),
            data,
            ts,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::SessionStart { .. } => EventKind::SessionStart,
            Self::SessionEnd { .. } => EventKind::SessionEnd,
            Self::Engagement { .. } => EventKind::Engagement,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::SessionStart { url, .. }
            | Self::SessionEnd { url, .. }
            | Self::Engagement { url, .. } => url,
        }
    }

    /// Epoch milliseconds at which the event was recorded
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        match self {
            Self::SessionStart { ts, .. }
            | Self::SessionEnd { ts, .. }
            | Self::Engagement { ts, .. } => *ts,
        }
    }
}

impl EventKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStart => "session_start",
            Self::SessionEnd => "session_end",
            Self::Engagement => "engagement",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session_start" | "start" => Ok(Self::SessionStart),
            "session_end" | "end" => Ok(Self::SessionEnd),
            "engagement" => Ok(Self::Engagement),
            _ => anyhow::bail!(
                "Unknown event kind: {s}. Use 'session_start', 'session_end', or 'engagement'"
            ),
        }
    }
}

/// User settings and privacy controls read by the tracker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub content_scanning: bool,
    /// URL substrings that are never tracked
    #[serde(default)]
    pub exclude_list: Vec<String>,
}
