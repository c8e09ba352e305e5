use crate::engine::Domain;
use serde::{Deserialize, Serialize};

/// The durable slice of engine state, one field per storage key. Loading
/// substitutes the caller's defaults for any missing key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub learned_trackers: Vec<Domain>,
    pub whitelist: Vec<Domain>,
    pub blacklist: Vec<Domain>,
    pub block_count: u64,
}

/// A partial write: exactly one key per save, mirroring how the lists and
/// the counter change independently at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Learned(Vec<Domain>),
    Whitelist(Vec<Domain>),
    Blacklist(Vec<Domain>),
    BlockCount(u64),
}

impl StateUpdate {
    pub fn key(&self) -> &'static str {
        match self {
            StateUpdate::Learned(_) => "learned_trackers",
            StateUpdate::Whitelist(_) => "whitelist",
            StateUpdate::Blacklist(_) => "blacklist",
            StateUpdate::BlockCount(_) => "block_count",
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        match self {
            StateUpdate::Learned(v) | StateUpdate::Whitelist(v) | StateUpdate::Blacklist(v) => {
                serde_json::json!(v)
            }
            StateUpdate::BlockCount(n) => serde_json::json!(n),
        }
    }
}
