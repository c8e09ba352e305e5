use super::rules::{BlockRule, RuleId};
use async_trait::async_trait;

/// The enforcement subsystem: whatever actually cancels requests. The engine
/// only ever hands it a complete rule set to install.
#[async_trait]
pub trait RuleEnforcer: Send + Sync {
    /// Identifiers of every rule currently installed by this engine.
    async fn active_rules(&self) -> anyhow::Result<Vec<RuleId>>;

    /// Removes `remove` and installs `add` as one atomic swap. Concurrent
    /// requests must never observe a window with neither set active.
    async fn replace_rules(&self, remove: Vec<RuleId>, add: Vec<BlockRule>) -> anyhow::Result<()>;
}

/// Display collaborator for the running block counter.
pub trait BadgeSink: Send + Sync {
    fn set_count(&self, count: u64);
}
