use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use trackstop::config::Config;
use trackstop::engine::{
    MemoryRuleEnforcer, RuleEnforcer, RuleSynchronizer, StaticListLoader, TrackerEngine,
};
use trackstop::init::{init_store, setup_logging, LogBadgeSink};
use trackstop::stats::StatsCollector;
use trackstop::store::{PersistedState, StatePersister};
use trackstop::{api, observer};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Config
    let config_path = std::env::args().nth(1).unwrap_or("config.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting trackstop...");

    if !std::path::Path::new(&config_path).exists() {
        info!("Config file not found, using defaults.");
    }

    // 3. Init Stats
    let stats = StatsCollector::new(config.stats.log_interval_seconds);

    // 4. Init Store & Load Persisted State
    let store = init_store(&config)?;
    let persisted = match store.load(PersistedState::default()).await {
        Ok(state) => state,
        Err(e) => {
            warn!("Failed to load persisted state, starting from defaults: {e:#}");
            PersistedState::default()
        }
    };
    info!(
        "Restored state: {} learned trackers, {} whitelisted, {} blacklisted, {} blocked so far",
        persisted.learned_trackers.len(),
        persisted.whitelist.len(),
        persisted.blacklist.len(),
        persisted.block_count
    );

    // 5. Load Static Blocklist
    let loader = StaticListLoader::new(config.clone());
    let static_blocklist = loader.load().await;

    // 6. Init Enforcement & Synchronizer
    let enforcer = Arc::new(MemoryRuleEnforcer::new());
    let synchronizer = RuleSynchronizer::new(
        enforcer.clone() as Arc<dyn RuleEnforcer>,
        config.rules.resource_types.clone(),
    );

    // 7. Build Engine & Install Initial Rules
    let persister = StatePersister::spawn(store.clone());
    let engine = Arc::new(TrackerEngine::new(
        static_blocklist,
        persisted,
        synchronizer,
        persister,
        Arc::new(LogBadgeSink),
        stats.clone(),
        config.logging.clone(),
    ));
    engine.sync_rules().await;

    // 8. Start Observer Loop
    let (events_tx, events_rx) = mpsc::channel(1024);
    let observer_task = tokio::spawn(observer::run(engine.clone(), events_rx));

    // 9. Start API Server
    tokio::spawn(api::start_api_server(
        engine.clone(),
        stats,
        enforcer as Arc<dyn RuleEnforcer>,
        events_tx,
        config.api.clone(),
    ));

    // 10. Graceful Shutdown
    tokio::select! {
        _ = observer_task => {},
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    Ok(())
}
