use super::domain::Domain;
use rustc_hash::{FxHashMap, FxHashSet};

/// Distinct first-party sites that must contact a candidate before it is
/// promoted to the learned tracker set. Exact comparison, no decay; the only
/// way back out of the learned set is a manual whitelist entry.
pub const PROMOTION_THRESHOLD: usize = 3;

/// Emitted once when a candidate crosses the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub domain: Domain,
}

/// Per-candidate record of which first-party sites have contacted it.
///
/// Callers must hold the engine's exclusive lock and check the preconditions
/// first: the candidate is not already known to any list, and the candidate
/// differs from the first party. Entries are removed on promotion, so a
/// promoted domain never accumulates further bookkeeping.
#[derive(Debug, Default)]
pub struct ObservationLog {
    sightings: FxHashMap<Domain, FxHashSet<Domain>>,
}

impl ObservationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one first-party sighting of the candidate. Returns a
    /// `Promotion` when the distinct-first-party count reaches the
    /// threshold; the candidate's entry is dropped at that point.
    pub fn observe(&mut self, candidate: &Domain, first_party: &Domain) -> Option<Promotion> {
        let sources = self.sightings.entry(candidate.clone()).or_default();
        sources.insert(first_party.clone());
        if sources.len() >= PROMOTION_THRESHOLD {
            self.sightings.remove(candidate);
            return Some(Promotion {
                domain: candidate.clone(),
            });
        }
        None
    }

    /// Distinct first parties recorded for a candidate so far.
    pub fn distinct_sources(&self, candidate: &Domain) -> usize {
        self.sightings.get(candidate).map_or(0, FxHashSet::len)
    }

    /// Number of candidates currently under observation.
    pub fn tracked(&self) -> usize {
        self.sightings.len()
    }
}
