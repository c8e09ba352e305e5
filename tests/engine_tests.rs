use std::sync::{Arc, Mutex};

use trackstop::config::LoggingConfig;
use trackstop::engine::{
    BadgeSink, Domain, MemoryRuleEnforcer, RequestEvent, RequestOutcome, ResourceType,
    RuleEnforcer, RuleSynchronizer, TrackerEngine,
};
use trackstop::stats::StatsCollector;
use trackstop::store::{MemoryStore, PersistedState, StatePersister, StateStore};

// --- Mocks ---

struct RecordingBadge {
    counts: Mutex<Vec<u64>>,
}

impl RecordingBadge {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            counts: Mutex::new(Vec::new()),
        })
    }

    fn last(&self) -> Option<u64> {
        self.counts.lock().unwrap().last().copied()
    }
}

impl BadgeSink for RecordingBadge {
    fn set_count(&self, count: u64) {
        self.counts.lock().unwrap().push(count);
    }
}

struct Harness {
    engine: Arc<TrackerEngine>,
    enforcer: Arc<MemoryRuleEnforcer>,
    store: Arc<MemoryStore>,
    badge: Arc<RecordingBadge>,
}

fn harness(static_list: &[&str]) -> Harness {
    let enforcer = Arc::new(MemoryRuleEnforcer::new());
    let store = Arc::new(MemoryStore::new());
    let badge = RecordingBadge::new();

    let engine = Arc::new(TrackerEngine::new(
        static_list
            .iter()
            .map(|s| Domain::parse(s).unwrap())
            .collect(),
        PersistedState::default(),
        RuleSynchronizer::new(
            enforcer.clone() as Arc<dyn RuleEnforcer>,
            ResourceType::default_scope(),
        ),
        StatePersister::spawn(store.clone()),
        badge.clone(),
        StatsCollector::new(3600),
        LoggingConfig::default(),
    ));

    Harness {
        engine,
        enforcer,
        store,
        badge,
    }
}

fn request(target: &str, initiator: &str, tab: Option<i64>) -> RequestEvent {
    RequestEvent {
        target_url: target.to_string(),
        initiator_url: initiator.to_string(),
        tab,
    }
}

fn domain(s: &str) -> Domain {
    Domain::parse(s).unwrap()
}

// --- Blocking & counting ---

#[tokio::test]
async fn test_static_tracker_is_blocked_and_counted() {
    let h = harness(&["ads.example"]);

    // Startup sync installs the static list
    h.engine.sync_rules().await;
    assert!(h.enforcer.matches("ads.example"));

    let outcome = h
        .engine
        .handle_request(request("https://ads.example/ad.js", "https://site.com/", Some(1)))
        .await;

    assert_eq!(
        outcome,
        RequestOutcome::Blocked {
            domain: domain("ads.example"),
            count: 1
        }
    );
    let snap = h.engine.snapshot(Some(1));
    assert_eq!(snap.block_count, 1);
    assert_eq!(snap.tab_blocked, vec![domain("ads.example")]);
    assert_eq!(h.badge.last(), Some(1));
}

#[tokio::test]
async fn test_block_count_is_raw_but_tab_set_dedups() {
    let h = harness(&["ads.example"]);

    for _ in 0..3 {
        h.engine
            .handle_request(request("https://ads.example/x", "https://site.com/", Some(5)))
            .await;
    }

    let snap = h.engine.snapshot(Some(5));
    assert_eq!(snap.block_count, 3);
    assert_eq!(snap.tab_blocked.len(), 1);
    assert_eq!(h.badge.last(), Some(3));
}

#[tokio::test]
async fn test_detached_request_counts_without_tab_record() {
    let h = harness(&["ads.example"]);

    let outcome = h
        .engine
        .handle_request(request("https://ads.example/x", "https://site.com/", None))
        .await;

    assert!(matches!(outcome, RequestOutcome::Blocked { count: 1, .. }));
    assert_eq!(h.engine.snapshot(None).block_count, 1);
    assert!(h.engine.snapshot(Some(1)).tab_blocked.is_empty());
}

#[tokio::test]
async fn test_tab_close_reclaims_records() {
    let h = harness(&["ads.example"]);

    h.engine
        .handle_request(request("https://ads.example/x", "https://site.com/", Some(9)))
        .await;
    assert_eq!(h.engine.snapshot(Some(9)).tab_blocked.len(), 1);

    h.engine.tab_closed(9);
    assert!(h.engine.snapshot(Some(9)).tab_blocked.is_empty());
    // The lifetime counter is untouched
    assert_eq!(h.engine.snapshot(Some(9)).block_count, 1);
}

#[tokio::test]
async fn test_block_count_is_persisted() {
    let h = harness(&["ads.example"]);

    h.engine
        .handle_request(request("https://ads.example/x", "https://site.com/", Some(1)))
        .await;

    // The persister worker runs asynchronously
    let mut persisted = PersistedState::default();
    for _ in 0..50 {
        persisted = h.store.load(PersistedState::default()).await.unwrap();
        if persisted.block_count == 1 {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }
    assert_eq!(persisted.block_count, 1);
}

// --- Self-requests and unparsable input ---

#[tokio::test]
async fn test_self_request_is_ignored() {
    let h = harness(&["site.com"]);

    let outcome = h
        .engine
        .handle_request(request("https://site.com/app.js", "https://site.com/", Some(1)))
        .await;

    // Even though site.com is statically listed, a first-party request is
    // never blocked or counted.
    assert_eq!(outcome, RequestOutcome::Ignored);
    assert_eq!(h.engine.snapshot(None).block_count, 0);
}

#[tokio::test]
async fn test_www_variant_is_still_a_self_request() {
    let h = harness(&[]);

    let outcome = h
        .engine
        .handle_request(request(
            "https://www.site.com/beacon",
            "https://site.com/",
            Some(1),
        ))
        .await;

    assert_eq!(outcome, RequestOutcome::Ignored);
}

#[tokio::test]
async fn test_unparsable_urls_are_ignored() {
    let h = harness(&["ads.example"]);

    for (target, initiator) in [
        ("not a url", "https://site.com/"),
        ("https://ads.example/x", ""),
        ("", ""),
    ] {
        let outcome = h.engine.handle_request(request(target, initiator, Some(1))).await;
        assert_eq!(outcome, RequestOutcome::Ignored, "{target:?} / {initiator:?}");
    }
    assert_eq!(h.engine.snapshot(None).block_count, 0);
}
