//! Focus/activity watcher.
//!
//! Normalizes raw browser signals into directives for the session tracker. The only
//! temporal smoothing is focus-loss debouncing: when no browser window is focused the
//! stop is held back for the debounce window and dropped if focus returns first.

use std::time::Duration;

use super::debounce::DebounceTimer;
use super::{Tab, TabId, WindowId};

/// Default debounce window for focus loss
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Raw signal from the host browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSignal {
    /// A tab became the active tab of its window
    TabActivated(Tab),
    /// Focus moved to `Some(window)`, or away from every browser window
    WindowFocusChanged(Option<WindowId>),
    /// A tab navigated to a new URL
    TabUpdated(Tab),
}

/// What the tracker should do in response to a signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Consider this tab as the new active tab
    Candidate(Tab),
    /// Ask the host for the active tab of this window and consider it
    Refresh(WindowId),
    /// Focus loss survived the debounce window
    Stop,
}

/// Translates host signals into tracker directives
#[derive(Debug)]
pub struct FocusWatcher {
    debounce: DebounceTimer,
    delay: Duration,
}

impl FocusWatcher {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            debounce: DebounceTimer::new(),
            delay,
        }
    }

    /// Observe a signal.
    ///
    /// `tracked` is the tab of the live session, if any; navigation in any other tab is
    /// ignored. While `paused` compensating signals still cancel the timer but nothing
    /// is emitted.
    pub fn observe(
        &mut self,
        signal: HostSignal,
        paused: bool,
        tracked: Option<TabId>,
    ) -> Option<Directive> {
        match signal {
            HostSignal::TabActivated(tab) => {
                self.debounce.cancel();
                (!paused).then_some(Directive::Candidate(tab))
            }
            HostSignal::WindowFocusChanged(None) => {
                if !paused {
                    self.debounce.arm(self.delay);
                    log::debug!("Browser lost focus, stop pending in {:?}", self.delay);
                }
                None
            }
            HostSignal::WindowFocusChanged(Some(window)) => {
                if self.debounce.cancel() {
                    log::debug!("Focus regained by window {window} within debounce window");
                }
                (!paused).then_some(Directive::Refresh(window))
            }
            HostSignal::TabUpdated(tab) => {
                (!paused && tracked == Some(tab.id)).then_some(Directive::Candidate(tab))
            }
        }
    }

    /// Resolves when the pending focus-loss timer runs out
    pub async fn debounce_elapsed(&self) {
        self.debounce.elapsed().await;
    }

    /// Consume an expired timer, yielding [`Directive::Stop`] unless paused
    pub fn on_debounce_expired(&mut self, paused: bool) -> Option<Directive> {
        (self.debounce.take_expired() && !paused).then_some(Directive::Stop)
    }

    #[must_use]
    pub const fn stop_pending(&self) -> bool {
        self.debounce.is_armed()
    }
}

impl Default for FocusWatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: TabId, url: &str) -> Tab {
        Tab::new(id, url)
    }

    #[test]
    fn test_activation_is_a_candidate() {
        let mut watcher = FocusWatcher::default();
        let directive = watcher.observe(
            HostSignal::TabActivated(tab(1, "https://a.example")),
            false,
            None,
        );
        assert_eq!(
            directive,
            Some(Directive::Candidate(tab(1, "https://a.example")))
        );
    }

    #[test]
    fn test_paused_suppresses_directives() {
        let mut watcher = FocusWatcher::default();
        assert_eq!(
            watcher.observe(HostSignal::TabActivated(tab(1, "https://a")), true, None),
            None
        );
        assert_eq!(
            watcher.observe(HostSignal::WindowFocusChanged(None), true, None),
            None
        );
        assert!(!watcher.stop_pending());
        assert_eq!(
            watcher.observe(HostSignal::WindowFocusChanged(Some(3)), true, None),
            None
        );
    }

    #[test]
    fn test_navigation_only_for_tracked_tab() {
        let mut watcher = FocusWatcher::default();
        assert_eq!(
            watcher.observe(HostSignal::TabUpdated(tab(2, "https://b")), false, Some(1)),
            None
        );
        assert_eq!(
            watcher.observe(HostSignal::TabUpdated(tab(1, "https://c")), false, Some(1)),
            Some(Directive::Candidate(tab(1, "https://c")))
        );
        assert_eq!(
            watcher.observe(HostSignal::TabUpdated(tab(1, "https://c")), false, None),
            None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_without_focus_stops_once() {
        let mut watcher = FocusWatcher::default();
        assert_eq!(
            watcher.observe(HostSignal::WindowFocusChanged(None), false, Some(1)),
            None
        );
        assert!(watcher.stop_pending());

        watcher.debounce_elapsed().await;
        assert_eq!(watcher.on_debounce_expired(false), Some(Directive::Stop));
        assert_eq!(watcher.on_debounce_expired(false), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_within_window_cancels_stop() {
        let mut watcher = FocusWatcher::default();
        watcher.observe(HostSignal::WindowFocusChanged(None), false, Some(1));
        tokio::time::advance(Duration::from_millis(100)).await;

        let directive = watcher.observe(HostSignal::WindowFocusChanged(Some(4)), false, Some(1));
        assert_eq!(directive, Some(Directive::Refresh(4)));
        assert!(!watcher.stop_pending());

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(watcher.on_debounce_expired(false), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_cancels_pending_stop() {
        let mut watcher = FocusWatcher::default();
        watcher.observe(HostSignal::WindowFocusChanged(None), false, Some(1));
        watcher.observe(HostSignal::TabActivated(tab(2, "https://b")), false, Some(1));
        assert!(!watcher.stop_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_while_paused_is_swallowed() {
        let mut watcher = FocusWatcher::default();
        watcher.observe(HostSignal::WindowFocusChanged(None), false, Some(1));
        watcher.debounce_elapsed().await;
        assert_eq!(watcher.on_debounce_expired(true), None);
        assert!(!watcher.stop_pending());
    }
}
