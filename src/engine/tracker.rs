use super::domain::{normalize, Domain};
use super::learner::{ObservationLog, Promotion};
use super::rules::RuleSynchronizer;
use super::state::{ClassificationState, ListOp, StateSnapshot, TabId, UserList};
use super::traits::BadgeSink;
use crate::config::LoggingConfig;
use crate::stats::StatsCollector;
use crate::store::{PersistedState, StatePersister, StateUpdate};
use rustc_hash::FxHashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Raw request metadata delivered by the interception collaborator.
#[derive(Debug, Clone)]
pub struct RequestEvent {
    pub target_url: String,
    pub initiator_url: String,
    /// None when the request is not associated with a visible tab.
    pub tab: Option<TabId>,
}

/// Terminal state of one request's trip through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Unparsable URL, self-request, or a known-but-not-blocked target.
    Ignored,
    Blocked { domain: Domain, count: u64 },
    Observed { domain: Domain, distinct_sources: usize },
    Promoted(Domain),
}

// What the learning step decided under the write lock; I/O happens after
// the lock is dropped.
enum LearnStep {
    Known,
    Observed(usize),
    Promoted {
        domain: Domain,
        learned: Vec<Domain>,
        effective: Vec<Domain>,
    },
}

struct EngineInner {
    state: ClassificationState,
    observations: ObservationLog,
}

/// Single owner of all mutable decision state. Decision reads take the read
/// lock; every count-and-record or observe-and-maybe-promote step is one
/// read-modify-write under the write lock, so two concurrent sightings of
/// the same candidate can never both promote it. The lock is never held
/// across an await; persistence and enforcement run after it is dropped.
pub struct TrackerEngine {
    inner: RwLock<EngineInner>,
    synchronizer: RuleSynchronizer,
    persister: StatePersister,
    badge: Arc<dyn BadgeSink>,
    stats: Arc<StatsCollector>,
    logging: LoggingConfig,
}

impl TrackerEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        static_blocklist: FxHashSet<Domain>,
        persisted: PersistedState,
        synchronizer: RuleSynchronizer,
        persister: StatePersister,
        badge: Arc<dyn BadgeSink>,
        stats: Arc<StatsCollector>,
        logging: LoggingConfig,
    ) -> Self {
        let state = ClassificationState::new(static_blocklist, persisted);
        badge.set_count(state.block_count());
        Self {
            inner: RwLock::new(EngineInner {
                state,
                observations: ObservationLog::new(),
            }),
            synchronizer,
            persister,
            badge,
            stats,
            logging,
        }
    }

    /// The per-request pipeline: normalize both sides, decide, then either
    /// count the block or feed the observation log.
    pub async fn handle_request(&self, event: RequestEvent) -> RequestOutcome {
        self.stats.inc_seen();

        let (target, initiator) =
            match (normalize(&event.target_url), normalize(&event.initiator_url)) {
                (Some(t), Some(i)) if t != i => (t, i),
                // Unknown hosts never match any list; first-party requests
                // are never tracking candidates.
                _ => {
                    self.stats.inc_ignored();
                    if self.logging.log_decisions {
                        debug!(target = %event.target_url, "request ignored");
                    }
                    return RequestOutcome::Ignored;
                }
            };

        if self.inner.read().unwrap().state.is_blocked(&target) {
            let count = {
                let mut inner = self.inner.write().unwrap();
                inner.state.record_block(&target, event.tab)
            };
            self.stats.inc_blocked();
            self.persister.queue(StateUpdate::BlockCount(count));
            self.badge.set_count(count);
            if self.logging.log_blocked {
                info!(domain = %target, initiator = %initiator, tab = ?event.tab, count, "blocked tracker request");
            }
            return RequestOutcome::Blocked {
                domain: target,
                count,
            };
        }

        let step = {
            let mut inner = self.inner.write().unwrap();
            // Re-checked under the write lock: another request may have
            // promoted or a command may have listed the target meanwhile.
            if inner.state.is_known(&target) {
                LearnStep::Known
            } else if let Some(Promotion { domain }) =
                inner.observations.observe(&target, &initiator)
            {
                inner.state.insert_learned(domain.clone());
                LearnStep::Promoted {
                    domain,
                    learned: inner.state.learned_sorted(),
                    effective: inner.state.effective_block_set(),
                }
            } else {
                LearnStep::Observed(inner.observations.distinct_sources(&target))
            }
        };

        match step {
            LearnStep::Known => {
                self.stats.inc_ignored();
                if self.logging.log_decisions {
                    debug!(domain = %target, "known domain, not a learning candidate");
                }
                RequestOutcome::Ignored
            }
            LearnStep::Observed(distinct_sources) => {
                self.stats.inc_observed();
                if self.logging.log_decisions {
                    debug!(domain = %target, initiator = %initiator, distinct_sources, "third-party sighting recorded");
                }
                RequestOutcome::Observed {
                    domain: target,
                    distinct_sources,
                }
            }
            LearnStep::Promoted {
                domain,
                learned,
                effective,
            } => {
                self.stats.inc_promoted();
                info!(domain = %domain, "learned new tracker");
                self.persister.queue(StateUpdate::Learned(learned));
                self.synchronizer.sync(effective).await;
                RequestOutcome::Promoted(domain)
            }
        }
    }

    /// Applies a whitelist/blacklist mutation. Returns whether anything
    /// changed; when it did, the list is persisted and the enforcement rule
    /// set is synchronized before this returns, so a caller observing
    /// success knows enforcement was already attempted.
    pub async fn mutate(&self, list: UserList, op: ListOp, domain: Domain) -> bool {
        let changed = {
            let mut inner = self.inner.write().unwrap();
            let changed = match op {
                ListOp::Add => inner.state.add(list, domain.clone()),
                ListOp::Remove => inner.state.remove(list, &domain),
            };
            changed.then(|| {
                (
                    inner.state.user_list_sorted(list),
                    inner.state.effective_block_set(),
                )
            })
        };

        match changed {
            Some((entries, effective)) => {
                self.stats.inc_mutation();
                debug!(list = ?list, op = ?op, domain = %domain, "user list updated");
                self.persister.queue(match list {
                    UserList::Whitelist => StateUpdate::Whitelist(entries),
                    UserList::Blacklist => StateUpdate::Blacklist(entries),
                });
                self.synchronizer.sync(effective).await;
                true
            }
            None => false,
        }
    }

    /// Pushes the current effective block set to enforcement. Called once at
    /// startup; afterwards every mutation and promotion syncs on its own.
    pub async fn sync_rules(&self) {
        let effective = self.inner.read().unwrap().state.effective_block_set();
        self.synchronizer.sync(effective).await;
    }

    pub fn snapshot(&self, tab: Option<TabId>) -> StateSnapshot {
        self.inner.read().unwrap().state.snapshot(tab)
    }

    /// Tab-close notification from the windowing collaborator.
    pub fn tab_closed(&self, tab: TabId) {
        self.inner.write().unwrap().state.drop_tab(tab);
        debug!(tab, "per-tab block records dropped");
    }

    pub fn is_blocked(&self, domain: &Domain) -> bool {
        self.inner.read().unwrap().state.is_blocked(domain)
    }

    pub fn is_known(&self, domain: &Domain) -> bool {
        self.inner.read().unwrap().state.is_known(domain)
    }
}
