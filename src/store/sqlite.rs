use super::types::{PersistedState, StateUpdate};
use super::StateStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// SQLite-backed key-value store. All access goes through one shared
/// connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open state database {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS engine_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        info!("State database initialized at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn read_key<T: serde::de::DeserializeOwned>(conn: &Connection, key: &str) -> Option<T> {
        let text: String = conn
            .prepare_cached("SELECT value FROM engine_state WHERE key = ?1")
            .ok()?
            .query_row(params![key], |row| row.get(0))
            .optional()
            .ok()??;
        serde_json::from_str(&text).ok()
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn load(&self, defaults: PersistedState) -> Result<PersistedState> {
        let conn = self.conn.lock().unwrap();
        Ok(PersistedState {
            learned_trackers: Self::read_key(&conn, "learned_trackers")
                .unwrap_or(defaults.learned_trackers),
            whitelist: Self::read_key(&conn, "whitelist").unwrap_or(defaults.whitelist),
            blacklist: Self::read_key(&conn, "blacklist").unwrap_or(defaults.blacklist),
            block_count: Self::read_key(&conn, "block_count").unwrap_or(defaults.block_count),
        })
    }

    async fn save(&self, update: StateUpdate) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let value = serde_json::to_string(&update.to_value())?;
        conn.prepare_cached(
            "INSERT INTO engine_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )?
        .execute(params![update.key(), value])?;
        Ok(())
    }
}
