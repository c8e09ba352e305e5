use super::domain::Domain;
use super::traits::RuleEnforcer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

pub type RuleId = u32;

/// Resource classes a block rule applies to, named the way the browser names
/// request types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "script")]
    Script,
    #[serde(rename = "xmlhttprequest")]
    XmlHttpRequest,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "stylesheet")]
    Stylesheet,
    #[serde(rename = "font")]
    Font,
    #[serde(rename = "media")]
    Media,
    #[serde(rename = "websocket")]
    Websocket,
    #[serde(rename = "other")]
    Other,
}

impl ResourceType {
    /// Subresource classes covered by default.
    pub fn default_scope() -> Vec<ResourceType> {
        vec![
            ResourceType::Script,
            ResourceType::XmlHttpRequest,
            ResourceType::Image,
            ResourceType::Stylesheet,
            ResourceType::Font,
        ]
    }
}

/// One enforcement rule: block subresource loads whose target host equals or
/// is a subdomain of `domain_filter`, for the listed resource types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRule {
    pub id: RuleId,
    pub domain_filter: Domain,
    pub resource_types: Vec<ResourceType>,
}

/// Builds one rule per domain. Ids run 1..=n in input order and are only
/// stable within a single synchronization; the previous set is removed
/// before the new one lands.
pub fn build_rules(effective: &[Domain], scope: &[ResourceType]) -> Vec<BlockRule> {
    effective
        .iter()
        .enumerate()
        .map(|(idx, domain)| BlockRule {
            id: idx as RuleId + 1,
            domain_filter: domain.clone(),
            resource_types: scope.to_vec(),
        })
        .collect()
}

/// Reconciles the decision state's effective block set against the
/// enforcement collaborator: full remove of the previously installed rules,
/// full install of the new set, never a delta.
pub struct RuleSynchronizer {
    enforcer: Arc<dyn RuleEnforcer>,
    scope: Vec<ResourceType>,
    // Serializes overlapping sync calls so replaces land in order.
    gate: Mutex<()>,
}

impl RuleSynchronizer {
    pub fn new(enforcer: Arc<dyn RuleEnforcer>, scope: Vec<ResourceType>) -> Self {
        Self {
            enforcer,
            scope,
            gate: Mutex::new(()),
        }
    }

    /// Pushes the complete effective set to the enforcement collaborator.
    /// Failures are logged and swallowed: the in-memory decision state stays
    /// authoritative, and the next call sends the full current set again.
    pub async fn sync(&self, effective: Vec<Domain>) {
        let _gate = self.gate.lock().await;

        let remove = match self.enforcer.active_rules().await {
            Ok(ids) => ids,
            Err(e) => {
                error!("rule sync: failed to read active rules: {e:#}");
                return;
            }
        };

        let rules = build_rules(&effective, &self.scope);
        let installed = rules.len();
        if let Err(e) = self.enforcer.replace_rules(remove, rules).await {
            error!("rule sync: enforcement rejected rule replace: {e:#}");
            return;
        }
        debug!(rules = installed, "enforcement rule set replaced");
    }
}
