//! Persistence collaborator: a key-value store for the durable slice of
//! engine state, plus the background task that feeds it.

pub mod memory;
pub mod sqlite;
pub mod types;

pub use self::memory::MemoryStore;
pub use self::sqlite::SqliteStore;
pub use self::types::{PersistedState, StateUpdate};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads persisted state, substituting `defaults` for missing keys.
    async fn load(&self, defaults: PersistedState) -> anyhow::Result<PersistedState>;

    async fn save(&self, update: StateUpdate) -> anyhow::Result<()>;
}

/// Hands writes to a background task. In-memory state stays authoritative:
/// a failed or dropped write is logged and never retried, and never blocks
/// the mutation that triggered it.
#[derive(Clone)]
pub struct StatePersister {
    tx: mpsc::Sender<StateUpdate>,
}

impl StatePersister {
    pub fn spawn(store: Arc<dyn StateStore>) -> Self {
        let (tx, mut rx) = mpsc::channel::<StateUpdate>(256);
        tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                if let Err(e) = store.save(update).await {
                    error!("state save failed: {e:#}");
                }
            }
        });
        Self { tx }
    }

    /// Fire and forget; a full buffer drops the write.
    pub fn queue(&self, update: StateUpdate) {
        if self.tx.try_send(update).is_err() {
            warn!("state persister buffer full, dropping write");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Domain;

    #[tokio::test]
    async fn test_persister_delivers_updates() {
        let store = Arc::new(MemoryStore::new());
        let persister = StatePersister::spawn(store.clone());

        persister.queue(StateUpdate::BlockCount(5));
        persister.queue(StateUpdate::Whitelist(vec![Domain::parse("ok.com").unwrap()]));

        // The worker drains asynchronously
        let mut loaded = PersistedState::default();
        for _ in 0..50 {
            loaded = store.load(PersistedState::default()).await.unwrap();
            if loaded.block_count == 5 && !loaded.whitelist.is_empty() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        }
        assert_eq!(loaded.block_count, 5);
        assert_eq!(loaded.whitelist, vec![Domain::parse("ok.com").unwrap()]);
    }
}
