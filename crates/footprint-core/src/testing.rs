//! In-memory collaborators for exercising the tracker without a browser.

use anyhow::Result;
use async_trait::async_trait;
use footprint_integrations::{ContentSummary, SessionSummary, Uplink};
use footprint_storage::{
    Clock, EngagementCounters, Event, EventStore, ManualClock, MemoryStorage, Settings,
    SettingsStore, Storage,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::bridge::{AgentBridge, PageSnapshot};
use crate::monitor::{Tab, TabId, TabObserver, WindowId};
use crate::privacy::UrlFilter;
use crate::session_manager::{Tracker, TrackerDeps};

/// Uplink that records what it was asked to send
#[derive(Default)]
pub struct RecordingUplink {
    sessions: Mutex<Vec<SessionSummary>>,
    contents: Mutex<Vec<ContentSummary>>,
    fail: AtomicBool,
}

impl RecordingUplink {
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn sessions(&self) -> Vec<SessionSummary> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn contents(&self) -> Vec<ContentSummary> {
        self.contents.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uplink for RecordingUplink {
    async fn send_session(&self, summary: &SessionSummary) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("collector unreachable");
        }
        self.sessions.lock().unwrap().push(summary.clone());
        Ok(())
    }

    async fn send_content(&self, summary: &ContentSummary) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("collector unreachable");
        }
        self.contents.lock().unwrap().push(summary.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Stand-in for the in-page agent: per-tab text and counters that reset on read
#[derive(Default)]
pub struct FakeAgent {
    pages: Mutex<HashMap<TabId, (String, EngagementCounters)>>,
}

impl FakeAgent {
    pub fn load_page(&self, tab_id: TabId, text: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(tab_id, (text.to_string(), EngagementCounters::default()));
    }

    pub fn interact(&self, tab_id: TabId, counters: EngagementCounters) {
        if let Some((_, current)) = self.pages.lock().unwrap().get_mut(&tab_id) {
            current.clicks += counters.clicks;
            current.keys += counters.keys;
            current.scrolls += counters.scrolls;
        }
    }

    pub fn counters(&self, tab_id: TabId) -> Option<EngagementCounters> {
        self.pages
            .lock()
            .unwrap()
            .get(&tab_id)
            .map(|(_, counters)| *counters)
    }
}

#[async_trait]
impl AgentBridge for FakeAgent {
    async fn request_full_text(&self, tab_id: TabId) -> PageSnapshot {
        let mut pages = self.pages.lock().unwrap();
        match pages.get_mut(&tab_id) {
            Some((text, counters)) => {
                let snapshot = PageSnapshot {
                    text: text.clone(),
                    engagement: *counters,
                };
                *counters = EngagementCounters::default();
                snapshot.truncated()
            }
            None => PageSnapshot::default(),
        }
    }
}

/// Host stand-in answering active-tab queries
#[derive(Default)]
pub struct FakeObserver {
    active: Mutex<Option<Tab>>,
    fail: AtomicBool,
}

impl FakeObserver {
    pub fn set_active(&self, tab: Option<Tab>) {
        *self.active.lock().unwrap() = tab;
    }

    pub fn fail_queries(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TabObserver for FakeObserver {
    async fn active_tab(&self, _window: Option<WindowId>) -> Result<Option<Tab>> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("native messaging port closed");
        }
        Ok(self.active.lock().unwrap().clone())
    }
}

/// Storage whose writes can be switched off
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    reject_writes: AtomicBool,
}

impl FlakyStorage {
    pub fn reject_writes(&self) {
        self.reject_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.inner.set(key, value).await
    }
}

/// A tracker wired to fakes
pub struct Harness {
    pub tracker: Tracker,
    pub store: Arc<EventStore>,
    pub settings: SettingsStore,
    pub storage: Arc<FlakyStorage>,
    pub clock: Arc<ManualClock>,
    pub uplink: Arc<RecordingUplink>,
    pub agent: Arc<FakeAgent>,
    pub observer: Arc<FakeObserver>,
}

impl Harness {
    pub fn with_fakes() -> Self {
        let storage = Arc::new(FlakyStorage::default());
        let clock = Arc::new(ManualClock::new(0));
        let uplink = Arc::new(RecordingUplink::default());
        let agent = Arc::new(FakeAgent::default());
        let observer = Arc::new(FakeObserver::default());
        let store = Arc::new(EventStore::new(storage.clone(), clock.clone()));
        let settings = SettingsStore::new(storage.clone());

        let deps = TrackerDeps {
            store: store.clone(),
            settings: settings.clone(),
            uplink: uplink.clone(),
            bridge: agent.clone(),
            observer: observer.clone(),
            clock: clock.clone(),
        };

        Self {
            tracker: Tracker::new(deps, UrlFilter::default()),
            store,
            settings,
            storage,
            clock,
            uplink,
            agent,
            observer,
        }
    }

    pub fn at(&self, ms: i64) {
        self.clock.set(ms);
    }

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    pub async fn exclude(&self, pattern: &str) {
        let mut settings: Settings = self.settings.load().await.unwrap();
        settings.exclude_list.push(pattern.to_string());
        self.settings.save(&settings).await.unwrap();
    }

    pub async fn events(&self) -> Vec<Event> {
        self.store.read_all().await.unwrap()
    }
}
