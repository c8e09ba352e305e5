//! Initialization helpers for the application startup.

use crate::config::Config;
use crate::engine::BadgeSink;
use crate::store::{MemoryStore, SqliteStore, StateStore};
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = config.logging.level.clone();

        // Suppress dependency noise unless explicitly overridden
        if !filter.contains("hyper") {
            filter.push_str(",hyper=warn");
        }
        if !filter.contains("reqwest") {
            filter.push_str(",reqwest=warn");
        }

        tracing_subscriber::EnvFilter::new(filter)
    });

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Builds the state store for the configured backend.
pub fn init_store(config: &Config) -> Result<Arc<dyn StateStore>> {
    match config.storage.backend.as_str() {
        "sqlite" => {
            info!("Using SQLite state store at {}", config.storage.sqlite_path);
            Ok(Arc::new(SqliteStore::open(&config.storage.sqlite_path)?))
        }
        "memory" => {
            info!("Using in-memory state store (state is not durable)");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => bail!("unknown storage backend: {other}"),
    }
}

/// Badge sink that reports the counter through the process log.
pub struct LogBadgeSink;

impl BadgeSink for LogBadgeSink {
    fn set_count(&self, count: u64) {
        debug!(count, "badge counter updated");
    }
}
