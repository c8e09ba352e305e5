use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{self, Duration};
use tracing::info;

/// Process-lifetime counters for observability. The persisted block counter
/// lives in the classification state; these reset with the process.
#[derive(Debug)]
pub struct StatsCollector {
    requests_seen: AtomicU64,
    ignored: AtomicU64,
    blocked: AtomicU64,
    observed: AtomicU64,
    promotions: AtomicU64,
    list_mutations: AtomicU64,

    log_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub requests_seen: u64,
    pub ignored: u64,
    pub blocked: u64,
    pub observed: u64,
    pub promotions: u64,
    pub list_mutations: u64,
}

impl StatsCollector {
    pub fn new(log_interval_sec: u64) -> Arc<Self> {
        let stats = Arc::new(Self {
            requests_seen: AtomicU64::new(0),
            ignored: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            observed: AtomicU64::new(0),
            promotions: AtomicU64::new(0),
            list_mutations: AtomicU64::new(0),
            log_interval: Duration::from_secs(log_interval_sec),
        });

        // Spawn background dumper
        let stats_clone = stats.clone();
        tokio::spawn(async move {
            stats_clone.run_logger().await;
        });

        stats
    }

    pub fn inc_seen(&self) {
        self.requests_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_observed(&self) {
        self.observed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_promoted(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_mutation(&self) {
        self.list_mutations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_seen: self.requests_seen.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            observed: self.observed.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            list_mutations: self.list_mutations.load(Ordering::Relaxed),
        }
    }

    async fn run_logger(&self) {
        let mut interval = time::interval(self.log_interval);
        loop {
            interval.tick().await;
            self.dump_stats();
        }
    }

    fn dump_stats(&self) {
        let snap = self.get_snapshot();
        let pct = if snap.requests_seen > 0 {
            (snap.blocked as f64 / snap.requests_seen as f64) * 100.0
        } else {
            0.0
        };
        info!(
            "STATS DUMP: Seen: {}, Blocked: {} ({:.1}%), Observed: {}, Promotions: {}, Ignored: {}, Mutations: {}",
            snap.requests_seen, snap.blocked, pct, snap.observed, snap.promotions, snap.ignored,
            snap.list_mutations
        );
    }
}
