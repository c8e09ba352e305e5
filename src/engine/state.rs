use super::domain::Domain;
use crate::store::types::PersistedState;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

/// Browser tab identifier. Requests not associated with a visible tab carry
/// no id at all instead of a sentinel value.
pub type TabId = i64;

/// The two user-mutable lists. The static blocklist and the learned set are
/// read-only from the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserList {
    Whitelist,
    Blacklist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    Add,
    Remove,
}

/// UI view of the decision state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub block_count: u64,
    pub learned_trackers: Vec<Domain>,
    pub whitelist: Vec<Domain>,
    pub blacklist: Vec<Domain>,
    pub tab_blocked: Vec<Domain>,
}

/// The authoritative in-memory decision state: static blocklist, learned
/// trackers, the user allow/deny overrides, the running block counter and
/// the per-tab blocked sets.
#[derive(Debug)]
pub struct ClassificationState {
    static_blocklist: FxHashSet<Domain>,
    learned: FxHashSet<Domain>,
    whitelist: FxHashSet<Domain>,
    blacklist: FxHashSet<Domain>,
    block_count: u64,
    per_tab: FxHashMap<TabId, FxHashSet<Domain>>,
}

impl ClassificationState {
    pub fn new(static_blocklist: FxHashSet<Domain>, persisted: PersistedState) -> Self {
        Self {
            static_blocklist,
            learned: persisted.learned_trackers.into_iter().collect(),
            whitelist: persisted.whitelist.into_iter().collect(),
            blacklist: persisted.blacklist.into_iter().collect(),
            block_count: persisted.block_count,
            per_tab: FxHashMap::default(),
        }
    }

    /// True iff the domain is in static ∪ learned ∪ blacklist and not
    /// whitelisted. The whitelist always wins.
    pub fn is_blocked(&self, domain: &Domain) -> bool {
        !self.whitelist.contains(domain)
            && (self.static_blocklist.contains(domain)
                || self.learned.contains(domain)
                || self.blacklist.contains(domain))
    }

    /// True iff the domain appears in any of the four lists. Known domains
    /// are no longer learning candidates.
    pub fn is_known(&self, domain: &Domain) -> bool {
        self.static_blocklist.contains(domain)
            || self.learned.contains(domain)
            || self.blacklist.contains(domain)
            || self.whitelist.contains(domain)
    }

    /// Returns false when the domain was already learned.
    pub fn insert_learned(&mut self, domain: Domain) -> bool {
        self.learned.insert(domain)
    }

    /// Idempotent add; returns whether anything changed.
    pub fn add(&mut self, list: UserList, domain: Domain) -> bool {
        match list {
            UserList::Whitelist => self.whitelist.insert(domain),
            UserList::Blacklist => self.blacklist.insert(domain),
        }
    }

    /// Idempotent remove; returns whether anything changed.
    pub fn remove(&mut self, list: UserList, domain: &Domain) -> bool {
        match list {
            UserList::Whitelist => self.whitelist.remove(domain),
            UserList::Blacklist => self.blacklist.remove(domain),
        }
    }

    /// Counts a blocked request and records the domain against its tab.
    /// The counter is a raw event count; the per-tab set deduplicates.
    pub fn record_block(&mut self, domain: &Domain, tab: Option<TabId>) -> u64 {
        self.block_count += 1;
        if let Some(tab) = tab {
            self.per_tab.entry(tab).or_default().insert(domain.clone());
        }
        self.block_count
    }

    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    pub fn drop_tab(&mut self, tab: TabId) {
        self.per_tab.remove(&tab);
    }

    /// (static ∪ learned ∪ blacklist) − whitelist, sorted so downstream rule
    /// ids are deterministic within a single synchronization.
    pub fn effective_block_set(&self) -> Vec<Domain> {
        let mut domains: Vec<Domain> = self
            .static_blocklist
            .iter()
            .chain(self.learned.iter())
            .chain(self.blacklist.iter())
            .filter(|d| !self.whitelist.contains(*d))
            .cloned()
            .collect();
        domains.sort_unstable();
        domains.dedup();
        domains
    }

    pub fn learned_sorted(&self) -> Vec<Domain> {
        sorted(&self.learned)
    }

    pub fn user_list_sorted(&self, list: UserList) -> Vec<Domain> {
        match list {
            UserList::Whitelist => sorted(&self.whitelist),
            UserList::Blacklist => sorted(&self.blacklist),
        }
    }

    pub fn snapshot(&self, tab: Option<TabId>) -> StateSnapshot {
        StateSnapshot {
            block_count: self.block_count,
            learned_trackers: self.learned_sorted(),
            whitelist: sorted(&self.whitelist),
            blacklist: sorted(&self.blacklist),
            tab_blocked: tab
                .and_then(|t| self.per_tab.get(&t))
                .map(sorted)
                .unwrap_or_default(),
        }
    }
}

fn sorted(set: &FxHashSet<Domain>) -> Vec<Domain> {
    let mut v: Vec<Domain> = set.iter().cloned().collect();
    v.sort_unstable();
    v
}
