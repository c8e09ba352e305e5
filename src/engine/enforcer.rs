use super::domain::Domain;
use super::rules::{BlockRule, RuleId};
use super::traits::RuleEnforcer;
use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::RwLock;

/// In-process rule table implementing the enforcement collaborator. Used by
/// the standalone binary (external agents poll it over the API) and by
/// tests.
#[derive(Debug, Default)]
pub struct MemoryRuleEnforcer {
    inner: RwLock<RuleTable>,
}

#[derive(Debug, Default)]
struct RuleTable {
    rules: FxHashMap<RuleId, BlockRule>,
    // Domain filters mirrored for direct host lookups.
    domains: FxHashSet<Domain>,
}

impl MemoryRuleEnforcer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the host equals, or is a subdomain of, any installed
    /// domain filter.
    pub fn matches(&self, host: &str) -> bool {
        let table = self.inner.read().unwrap();
        let mut part = host;
        loop {
            if table.domains.contains(part) {
                return true;
            }
            // Strip leading label
            match part.find('.') {
                Some(idx) => {
                    part = &part[idx + 1..];
                    if part.is_empty() {
                        return false;
                    }
                }
                None => return false,
            }
        }
    }

    /// Installed rules, ordered by id.
    pub fn installed(&self) -> Vec<BlockRule> {
        let table = self.inner.read().unwrap();
        let mut rules: Vec<BlockRule> = table.rules.values().cloned().collect();
        rules.sort_by_key(|r| r.id);
        rules
    }
}

#[async_trait]
impl RuleEnforcer for MemoryRuleEnforcer {
    async fn active_rules(&self) -> anyhow::Result<Vec<RuleId>> {
        let table = self.inner.read().unwrap();
        Ok(table.rules.keys().copied().collect())
    }

    async fn replace_rules(&self, remove: Vec<RuleId>, add: Vec<BlockRule>) -> anyhow::Result<()> {
        let mut table = self.inner.write().unwrap();
        for id in remove {
            table.rules.remove(&id);
        }
        for rule in add {
            table.rules.insert(rule.id, rule);
        }
        let domains: FxHashSet<Domain> = table
            .rules
            .values()
            .map(|r| r.domain_filter.clone())
            .collect();
        table.domains = domains;
        Ok(())
    }
}
