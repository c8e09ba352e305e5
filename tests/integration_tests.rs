use std::sync::Arc;

use trackstop::config::Config;
use trackstop::engine::{
    BadgeSink, MemoryRuleEnforcer, RuleEnforcer, RuleSynchronizer, StaticListLoader, TrackerEngine,
};
use trackstop::init::LogBadgeSink;
use trackstop::stats::StatsCollector;
use trackstop::store::{MemoryStore, PersistedState, StatePersister, StateStore};

#[tokio::test]
async fn test_full_wiring_from_defaults() {
    let config = Config::default();
    let stats = StatsCollector::new(config.stats.log_interval_seconds);

    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let persisted = store.load(PersistedState::default()).await.unwrap();

    // No sources configured: the built-in fallback keeps coverage non-empty
    let static_blocklist = StaticListLoader::new(config.clone()).load().await;
    assert!(!static_blocklist.is_empty());

    let enforcer = Arc::new(MemoryRuleEnforcer::new());
    let engine = TrackerEngine::new(
        static_blocklist,
        persisted,
        RuleSynchronizer::new(
            enforcer.clone() as Arc<dyn RuleEnforcer>,
            config.rules.resource_types.clone(),
        ),
        StatePersister::spawn(store),
        Arc::new(LogBadgeSink) as Arc<dyn BadgeSink>,
        stats,
        config.logging.clone(),
    );

    engine.sync_rules().await;
    assert_eq!(
        enforcer.installed().len(),
        engine.snapshot(None).learned_trackers.len()
            + StaticListLoader::fallback().len()
    );
    assert!(enforcer.matches("doubleclick.net"));
    assert!(enforcer.matches("stats.g.doubleclick.net"));
}
