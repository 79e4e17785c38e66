//! Session state machine.
//!
//! A [`Tracker`] owns the single live [`Session`] (or none, when idle) and the paused
//! flag. It is driven by one event loop holding `&mut Tracker`, so transitions are
//! serialized: a candidate that arrives while a stop is being processed is only looked
//! at once the previous session has been cleared.

use footprint_integrations::{ContentSummary, SessionSummary, Uplink};
use footprint_storage::{Clock, Event, EventStore, Settings, SettingsStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::AgentBridge;
use crate::monitor::{Tab, TabId, TabObserver, WindowId};
use crate::privacy::{Rejection, UrlFilter};
use crate::tasks::SideEffects;

#[cfg(test)]
mod tests;

/// One continuous period during which a single tab/URL was the tracked active tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub tab_id: TabId,
    pub url: String,
    /// Epoch milliseconds
    pub started_at: i64,
}

impl Session {
    /// Check whether `tab` is the tab/URL this session tracks
    #[must_use]
    pub fn matches(&self, tab: &Tab) -> bool {
        self.tab_id == tab.id && self.url == tab.url
    }
}

/// Why a live session is being ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Switch,
    FocusLost,
    Paused,
    Shutdown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Switch => "switch",
            Self::FocusLost => "focus lost",
            Self::Paused => "paused",
            Self::Shutdown => "shutdown",
        })
    }
}

/// Outcome of feeding the tracker a signal or command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Idle -> Active
    Started(Session),
    /// Active -> Active with a different tab or URL
    Switched { ended: Session, started: Session },
    /// Active -> Idle
    Stopped(Session),
    /// Candidate equals the live session
    Unchanged,
    /// Candidate failed validation
    Rejected(Rejection),
    /// Nothing to do (paused, idle, or no active tab)
    Ignored,
}

/// Collaborators the tracker talks to at transition boundaries
#[derive(Clone)]
pub struct TrackerDeps {
    pub store: Arc<EventStore>,
    pub settings: SettingsStore,
    pub uplink: Arc<dyn Uplink>,
    pub bridge: Arc<dyn AgentBridge>,
    pub observer: Arc<dyn TabObserver>,
    pub clock: Arc<dyn Clock>,
}

/// Owns the current session and the paused flag
pub struct Tracker {
    session: Option<Session>,
    paused: bool,
    filter: UrlFilter,
    deps: TrackerDeps,
    side_effects: SideEffects,
}

impl Tracker {
    #[must_use]
    pub fn new(deps: TrackerDeps, filter: UrlFilter) -> Self {
        Self {
            session: None,
            paused: false,
            filter,
            deps,
            side_effects: SideEffects::new(),
        }
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub const fn current_session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Tab of the live session, if any
    #[must_use]
    pub fn tracked_tab(&self) -> Option<TabId> {
        self.session.as_ref().map(|s| s.tab_id)
    }

    /// Consider `tab` as the new active tab
    pub async fn on_candidate(&mut self, tab: Tab) -> Transition {
        if self.paused {
            log::debug!("Tracking paused, ignoring tab {}", tab.id);
            return Transition::Ignored;
        }

        let Some(settings) = self.load_settings().await else {
            return Transition::Rejected(Rejection::SettingsUnavailable);
        };
        if let Err(rejection) = self.filter.check(&tab.url, &settings) {
            log::debug!("Not tracking tab {} ({rejection})", tab.id);
            return Transition::Rejected(rejection);
        }

        if self.session.as_ref().is_some_and(|s| s.matches(&tab)) {
            return Transition::Unchanged;
        }

        let ended = self.stop_active(StopReason::Switch).await;
        let started = self.start(tab).await;
        match ended {
            Some(ended) => Transition::Switched { ended, started },
            None => Transition::Started(started),
        }
    }

    /// End the live session, if any
    pub async fn end_session(&mut self, reason: StopReason) -> Transition {
        self.stop_active(reason)
            .await
            .map_or(Transition::Ignored, Transition::Stopped)
    }

    /// Pause tracking, ending the live session
    pub async fn pause(&mut self) -> Transition {
        if !self.paused {
            log::info!("Tracking paused");
        }
        self.paused = true;
        self.end_session(StopReason::Paused).await
    }

    /// Resume tracking and pick up the host's current active tab
    pub async fn resume(&mut self) -> Transition {
        if self.paused {
            log::info!("Tracking resumed");
        }
        self.paused = false;
        self.refresh_from_host(None).await
    }

    /// Ask the host for the active tab of `window` (last focused window when `None`)
    /// and consider it as a candidate
    pub async fn refresh_from_host(&mut self, window: Option<WindowId>) -> Transition {
        if self.paused {
            return Transition::Ignored;
        }

        match self.deps.observer.active_tab(window).await {
            Ok(Some(tab)) => self.on_candidate(tab).await,
            Ok(None) => {
                log::debug!("Host reports no active tab");
                Transition::Ignored
            }
            Err(e) => {
                log::warn!("Failed to query active tab: {e:#}");
                Transition::Ignored
            }
        }
    }

    /// Forward page text sent unsolicited by the in-page agent
    pub fn forward_page_content(&mut self, url: String, text: String) {
        let uplink = self.deps.uplink.clone();
        self.side_effects.spawn("page content upload", async move {
            uplink.send_content(&ContentSummary::new(url, text)).await
        });
    }

    /// Wait for all in-flight side effects
    pub async fn flush(&mut self) {
        self.side_effects.flush().await;
    }

    /// End the live session and give side effects up to `grace` to finish
    pub async fn shutdown(&mut self, grace: Duration) {
        self.end_session(StopReason::Shutdown).await;
        self.side_effects.shutdown(grace).await;
    }

    async fn load_settings(&self) -> Option<Settings> {
        match self.deps.settings.load().await {
            Ok(settings) => Some(settings),
            Err(e) => {
                log::warn!("Failed to read settings: {e:#}");
                None
            }
        }
    }

    async fn start(&mut self, tab: Tab) -> Session {
        let session = Session {
            tab_id: tab.id,
            url: tab.url,
            started_at: self.deps.clock.now_ms(),
        };
        self.session = Some(session.clone());
        log::info!("Session started: {} (tab {})", session.url, session.tab_id);

        if let Err(e) = self
            .deps
            .store
            .append(Event::session_start(&session.url, session.started_at))
            .await
        {
            log::warn!("Failed to record session start: {e:#}");
        }
        session
    }

    /// Stop procedure. Clearing the session is unconditional; the end event is written
    /// before returning so it precedes any following start, and the uploads run as
    /// independent side effects.
    async fn stop_active(&mut self, reason: StopReason) -> Option<Session> {
        let session = self.session.take()?;
        let end = self.deps.clock.now_ms();
        log::info!(
            "Session ended: {} after {} ms ({reason})",
            session.url,
            end - session.started_at
        );

        if let Err(e) = self
            .deps
            .store
            .append(Event::session_end(&session.url, session.started_at, end))
            .await
        {
            log::warn!("Failed to record session end: {e:#}");
        }

        self.spawn_session_upload(&session, end);
        self.spawn_content_capture(&session);
        Some(session)
    }

    fn spawn_session_upload(&mut self, session: &Session, end: i64) {
        let uplink = self.deps.uplink.clone();
        let summary = SessionSummary::new(session.url.clone(), session.started_at, end);
        self.side_effects.spawn("session upload", async move {
            uplink.send_session(&summary).await
        });
    }

    fn spawn_content_capture(&mut self, session: &Session) {
        let TrackerDeps {
            store,
            uplink,
            bridge,
            clock,
            ..
        } = self.deps.clone();
        let tab_id = session.tab_id;
        let url = session.url.clone();

        self.side_effects.spawn("page content capture", async move {
            let snapshot = bridge.request_full_text(tab_id).await;
            let sent = uplink
                .send_content(&ContentSummary::new(url.clone(), snapshot.text))
                .await;

            if !snapshot.engagement.is_zero() {
                let event = Event::engagement(url, snapshot.engagement, clock.now_ms());
                if let Err(e) = store.append(event).await {
                    log::warn!("Failed to record engagement read at session end: {e:#}");
                }
            }
            sent
        });
    }
}
