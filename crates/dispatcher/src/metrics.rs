//! In-flight send metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters shared between the dispatch loop and its send tasks
#[derive(Debug, Default)]
pub struct InFlightMetrics {
    /// Sends currently awaiting the sink
    in_flight: AtomicUsize,
    /// Highest concurrent in-flight count observed
    peak: AtomicUsize,
    /// Total sends started
    started: AtomicU64,
}

impl InFlightMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current in-flight count
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Get the peak in-flight count
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Get total sends started
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    /// Mark a send as started; the returned guard marks it finished on drop
    pub fn enter(self: &Arc<Self>) -> InFlightGuard {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        self.started.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            metrics: Arc::clone(self),
        }
    }
}

/// Decrements the in-flight count when dropped
#[derive(Debug)]
pub struct InFlightGuard {
    metrics: Arc<InFlightMetrics>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.metrics.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
