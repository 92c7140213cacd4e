//! Run summary printed at the end of `loadgen run`.

use std::collections::BTreeMap;
use std::fmt;

use contracts::SinkConfig;
use dispatcher::{RunReport, SendTally};

/// Report of a finished run plus what it ran against
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: RunReport,
    pub profile: String,
    pub sink: SinkConfig,
}

impl RunSummary {
    pub fn new(report: RunReport, profile: String, sink: SinkConfig) -> Self {
        Self {
            report,
            profile,
            sink,
        }
    }

    /// Events per second of wall-clock time
    pub fn events_per_sec(&self) -> f64 {
        let secs = self.report.duration.as_secs_f64();
        if secs > 0.0 {
            self.report.stats.dispatched as f64 / secs
        } else {
            0.0
        }
    }

    /// Epochs and tallies grouped by mode
    pub fn by_mode(&self) -> BTreeMap<&'static str, (u64, SendTally)> {
        let mut modes: BTreeMap<&'static str, (u64, SendTally)> = BTreeMap::new();
        for epoch in &self.report.epochs {
            let entry = modes.entry(epoch.mode.as_str()).or_default();
            entry.0 += 1;
            entry.1.sent += epoch.tally.sent;
            entry.1.skipped += epoch.tally.skipped;
            entry.1.failed += epoch.tally.failed;
        }
        modes
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Profile: {}", self.profile)?;
        writeln!(
            f,
            "Sink: {} ({})",
            self.sink.name,
            self.sink.sink_type.as_str()
        )?;
        writeln!(
            f,
            "Duration: {:.2}s ({:.1} events/s){}",
            self.report.duration.as_secs_f64(),
            self.events_per_sec(),
            if self.report.cancelled {
                " [cancelled]"
            } else {
                ""
            }
        )?;
        write!(f, "{}", self.report.stats)?;

        let modes = self.by_mode();
        if !modes.is_empty() {
            writeln!(f, "Per mode:")?;
            for (mode, (epochs, tally)) in modes {
                writeln!(
                    f,
                    "  {mode:<9} epochs={epochs:<5} sent={} skipped={} failed={}",
                    tally.sent, tally.skipped, tally.failed
                )?;
            }
        }
        Ok(())
    }
}
