//! Run and epoch reports

use std::time::Duration;

use contracts::{LoadMode, SendStatus};
use observability::RunStats;

/// Settled sends, by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendTally {
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl SendTally {
    pub fn record(&mut self, status: SendStatus) {
        match status {
            SendStatus::Sent => self.sent += 1,
            SendStatus::Skipped => self.skipped += 1,
            SendStatus::Failed => self.failed += 1,
        }
    }

    /// Every settled send
    pub fn total(&self) -> u64 {
        self.sent + self.skipped + self.failed
    }
}

/// Outcome of one epoch
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// 0-based epoch index (= elapsed seconds at a 1s epoch)
    pub index: u64,
    pub mode: LoadMode,
    /// Target logical queries for this epoch
    pub rate: u64,
    pub tally: SendTally,
    /// Time spent generating and sending, pacing excluded
    pub elapsed: Duration,
    /// Processing used the whole epoch; no pacing sleep followed
    pub overrun: bool,
}

impl EpochReport {
    /// Events dispatched in this epoch
    pub fn dispatched(&self) -> u64 {
        self.tally.total()
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub epochs: Vec<EpochReport>,
    pub stats: RunStats,
    /// Stopped by the cancellation token before all epochs ran
    pub cancelled: bool,
    /// Wall-clock duration including pacing
    pub duration: Duration,
}

impl RunReport {
    pub(crate) fn push_epoch(&mut self, epoch: EpochReport) {
        self.stats.update_epoch(
            epoch.rate,
            epoch.elapsed.as_secs_f64() * 1000.0,
            epoch.overrun,
        );
        self.stats
            .add_sends(epoch.tally.sent, epoch.tally.skipped, epoch.tally.failed);
        self.epochs.push(epoch);
    }

    /// Totals over every epoch
    pub fn totals(&self) -> SendTally {
        SendTally {
            sent: self.stats.sent,
            skipped: self.stats.skipped,
            failed: self.stats.failed,
        }
    }

    pub fn epoch_count(&self) -> u64 {
        self.epochs.len() as u64
    }

    pub fn overruns(&self) -> u64 {
        self.stats.overruns
    }
}
