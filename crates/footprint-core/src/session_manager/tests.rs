use super::*;
use crate::testing::Harness;
use footprint_storage::{EngagementCounters, EventKind};

const A: &str = "https://a.example";
const B: &str = "https://b.example";

fn count(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind() == kind).count()
}

#[tokio::test]
async fn test_switch_pause_resume_sequence() {
    let mut h = Harness::with_fakes();

    h.at(0);
    let t = h.tracker.on_candidate(Tab::new(1, A)).await;
    assert!(matches!(t, Transition::Started(_)));

    h.at(5000);
    let t = h.tracker.on_candidate(Tab::new(2, B)).await;
    assert!(matches!(t, Transition::Switched { .. }));

    h.at(8000);
    let t = h.tracker.pause().await;
    assert!(matches!(t, Transition::Stopped(_)));
    assert!(h.tracker.is_paused());
    assert!(h.tracker.current_session().is_none());

    h.at(9000);
    h.observer.set_active(Some(Tab::new(2, B)));
    let t = h.tracker.resume().await;
    assert!(matches!(t, Transition::Started(_)));
    assert!(!h.tracker.is_paused());

    assert_eq!(
        h.events().await,
        vec![
            Event::session_start(A, 0),
            Event::session_end(A, 0, 5000),
            Event::session_start(B, 5000),
            Event::session_end(B, 5000, 8000),
            Event::session_start(B, 9000),
        ]
    );

    let session = h.tracker.current_session().unwrap();
    assert_eq!(session.started_at, 9000);
    assert_eq!(session.tab_id, 2);
}

#[tokio::test]
async fn test_duplicate_candidate_is_idempotent() {
    let mut h = Harness::with_fakes();
    h.tracker.on_candidate(Tab::new(1, A)).await;

    h.clock.advance(1000);
    let t = h.tracker.on_candidate(Tab::new(1, A)).await;
    assert_eq!(t, Transition::Unchanged);
    assert_eq!(h.events().await.len(), 1);
}

#[tokio::test]
async fn test_excluded_candidate_never_starts() {
    let mut h = Harness::with_fakes();
    h.exclude("bank").await;

    let t = h
        .tracker
        .on_candidate(Tab::new(1, "https://mybank.example/login"))
        .await;
    assert_eq!(
        t,
        Transition::Rejected(Rejection::Excluded {
            pattern: "bank".to_string()
        })
    );
    assert!(h.events().await.is_empty());

    // Excluded tab while another session is live leaves that session alone
    h.tracker.on_candidate(Tab::new(2, A)).await;
    h.tracker
        .on_candidate(Tab::new(1, "https://mybank.example/login"))
        .await;
    assert_eq!(h.tracker.tracked_tab(), Some(2));
    assert_eq!(count(&h.events().await, EventKind::SessionStart), 1);
}

#[tokio::test]
async fn test_exclude_list_reread_per_decision() {
    let mut h = Harness::with_fakes();
    h.tracker.on_candidate(Tab::new(1, A)).await;
    h.exclude("b.example").await;

    let t = h.tracker.on_candidate(Tab::new(2, B)).await;
    assert!(matches!(t, Transition::Rejected(Rejection::Excluded { .. })));
    assert_eq!(h.tracker.tracked_tab(), Some(1));
}

#[tokio::test]
async fn test_internal_and_blank_pages_rejected() {
    let mut h = Harness::with_fakes();

    let t = h
        .tracker
        .on_candidate(Tab::new(1, "chrome://extensions"))
        .await;
    assert_eq!(t, Transition::Rejected(Rejection::InternalPage));

    let t = h.tracker.on_candidate(Tab::new(1, "")).await;
    assert_eq!(t, Transition::Rejected(Rejection::MissingUrl));

    assert!(h.tracker.current_session().is_none());
    assert!(h.events().await.is_empty());
}

#[tokio::test]
async fn test_same_tab_navigation_restarts_session() {
    let mut h = Harness::with_fakes();
    h.tracker.on_candidate(Tab::new(1, A)).await;

    h.at(2000);
    let t = h
        .tracker
        .on_candidate(Tab::new(1, "https://a.example/next"))
        .await;
    match t {
        Transition::Switched { ended, started } => {
            assert_eq!(ended.url, A);
            assert_eq!(started.url, "https://a.example/next");
            assert_eq!(started.tab_id, 1);
        }
        other => panic!("expected switch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_paused_ignores_candidates() {
    let mut h = Harness::with_fakes();
    h.tracker.pause().await;

    assert_eq!(
        h.tracker.on_candidate(Tab::new(1, A)).await,
        Transition::Ignored
    );
    assert_eq!(h.tracker.refresh_from_host(Some(1)).await, Transition::Ignored);
    assert!(h.events().await.is_empty());
}

#[tokio::test]
async fn test_pause_when_idle_writes_nothing() {
    let mut h = Harness::with_fakes();
    assert_eq!(h.tracker.pause().await, Transition::Ignored);
    assert_eq!(h.tracker.pause().await, Transition::Ignored);
    assert!(h.tracker.is_paused());
    assert!(h.events().await.is_empty());
}

#[tokio::test]
async fn test_stop_uploads_session_and_content() {
    let mut h = Harness::with_fakes();
    h.agent.load_page(1, "Hello from A");

    h.at(1000);
    h.tracker.on_candidate(Tab::new(1, A)).await;
    h.agent.interact(1, EngagementCounters::new(3, 10, 2));

    h.at(4000);
    h.tracker.end_session(StopReason::FocusLost).await;
    h.tracker.flush().await;

    let sessions = h.uplink.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].url, A);
    assert_eq!(sessions[0].start_time, 1000);
    assert_eq!(sessions[0].end_time, 4000);
    assert_eq!(sessions[0].duration, 3000);

    let contents = h.uplink.contents();
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].html, "Hello from A");

    assert_eq!(h.agent.counters(1), Some(EngagementCounters::default()));
    let events = h.events().await;
    assert_eq!(
        events.last(),
        Some(&Event::engagement(A, EngagementCounters::new(3, 10, 2), 4000))
    );
}

#[tokio::test]
async fn test_unreachable_agent_still_uploads_empty_content() {
    let mut h = Harness::with_fakes();
    h.tracker.on_candidate(Tab::new(9, A)).await;
    h.tracker.end_session(StopReason::Switch).await;
    h.tracker.flush().await;

    let contents = h.uplink.contents();
    assert_eq!(contents.len(), 1);
    assert!(contents[0].html.is_empty());
    assert_eq!(count(&h.events().await, EventKind::Engagement), 0);
}

#[tokio::test]
async fn test_failing_uplink_still_clears_session() {
    let mut h = Harness::with_fakes();
    h.uplink.fail_all();
    h.tracker.on_candidate(Tab::new(1, A)).await;

    let t = h.tracker.end_session(StopReason::FocusLost).await;
    assert!(matches!(t, Transition::Stopped(_)));
    assert!(h.tracker.current_session().is_none());
    h.tracker.flush().await;

    let started = h.tracker.on_candidate(Tab::new(2, B)).await;
    assert!(matches!(started, Transition::Started(_)));
}

#[tokio::test]
async fn test_store_failure_still_clears_session() {
    let mut h = Harness::with_fakes();
    h.tracker.on_candidate(Tab::new(1, A)).await;
    h.storage.reject_writes();

    h.tracker.end_session(StopReason::FocusLost).await;
    assert!(h.tracker.current_session().is_none());
    h.tracker.flush().await;
    assert_eq!(h.uplink.sessions().len(), 1);
}

#[tokio::test]
async fn test_resume_without_active_tab_stays_idle() {
    let mut h = Harness::with_fakes();
    h.tracker.pause().await;
    assert_eq!(h.tracker.resume().await, Transition::Ignored);
    assert!(!h.tracker.is_paused());

    h.tracker.pause().await;
    h.observer.fail_queries();
    assert_eq!(h.tracker.resume().await, Transition::Ignored);
    assert!(!h.tracker.is_paused());
    assert!(h.tracker.current_session().is_none());
}

#[tokio::test]
async fn test_start_end_counts_stay_balanced() {
    let mut h = Harness::with_fakes();
    let urls = [A, B, "https://c.example", A, "chrome://newtab", B, A];

    for (i, url) in urls.iter().enumerate() {
        h.clock.advance(100);
        h.tracker.on_candidate(Tab::new(i as i64, *url)).await;

        let events = h.events().await;
        let starts = count(&events, EventKind::SessionStart);
        let ends = count(&events, EventKind::SessionEnd);
        let live = usize::from(h.tracker.current_session().is_some());
        assert_eq!(starts, ends + live);
    }

    h.tracker.shutdown(Duration::from_secs(1)).await;
    let events = h.events().await;
    assert_eq!(
        count(&events, EventKind::SessionStart),
        count(&events, EventKind::SessionEnd)
    );
    assert_eq!(h.now(), 700);
}
