//! Collector counters and peak live-object tracking.
//!
//! Keep this cheap: plain relaxed atomics, snapshotted on demand.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

#[derive(Default)]
pub struct GcStats {
    collections: AtomicU64,
    swept: AtomicU64,
    finalizers_run: AtomicU64,
    peak_live: AtomicUsize,
}

/// Point-in-time copy of [`GcStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GcSnapshot {
    pub collections: u64,
    pub swept: u64,
    pub finalizers_run: u64,
    pub peak_live: usize,
}

impl GcStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new live-object count; updates peak if higher.
    pub fn record_live(&self, live: usize) {
        let mut cur = self.peak_live.load(Ordering::Relaxed);
        while live > cur {
            match self.peak_live.compare_exchange(
                cur,
                live,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => cur = observed,
            }
        }
    }

    pub fn record_collection(&self, swept: usize, finalized: usize) {
        self.collections.fetch_add(1, Ordering::Relaxed);
        self.swept.fetch_add(swept as u64, Ordering::Relaxed);
        self.finalizers_run
            .fetch_add(finalized as u64, Ordering::Relaxed);
    }

    pub fn record_finalized(&self, n: usize) {
        self.finalizers_run.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GcSnapshot {
        GcSnapshot {
            collections: self.collections.load(Ordering::Relaxed),
            swept: self.swept.load(Ordering::Relaxed),
            finalizers_run: self.finalizers_run.load(Ordering::Relaxed),
            peak_live: self.peak_live.load(Ordering::Relaxed),
        }
    }
}
