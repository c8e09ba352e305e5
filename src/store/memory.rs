use super::types::{PersistedState, StateUpdate};
use super::StateStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory key-value store: the default backend and the one tests use.
/// State lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<&'static str, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn get_or<T: serde::de::DeserializeOwned>(
    values: &HashMap<&'static str, Value>,
    key: &str,
    default: T,
) -> T {
    values
        .get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(default)
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self, defaults: PersistedState) -> anyhow::Result<PersistedState> {
        let values = self.values.read().unwrap();
        Ok(PersistedState {
            learned_trackers: get_or(&values, "learned_trackers", defaults.learned_trackers),
            whitelist: get_or(&values, "whitelist", defaults.whitelist),
            blacklist: get_or(&values, "blacklist", defaults.blacklist),
            block_count: get_or(&values, "block_count", defaults.block_count),
        })
    }

    async fn save(&self, update: StateUpdate) -> anyhow::Result<()> {
        let mut values = self.values.write().unwrap();
        values.insert(update.key(), update.to_value());
        Ok(())
    }
}
