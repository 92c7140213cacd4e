//! LoadProfile trait and the constant-mode profile.

use contracts::{ContractError, LoadMode, RunBlueprint};

use crate::Schedule;

/// Target rate for a mode at a point of the run
///
/// Constant modes do not depend on `elapsed_secs`; the parameter keeps the
/// signature identical to the time-varying profiles.
pub fn rate_for(mode: LoadMode, base_rate: u64, elapsed_secs: u64) -> u64 {
    mode.rate_for(base_rate, elapsed_secs)
}

/// Time-indexed rate function
///
/// Implementations must be pure: the same inputs always produce the same
/// output, so schedules can be tested without running a dispatcher.
pub trait LoadProfile: Send + Sync {
    /// Mode active `elapsed_secs` seconds into the run
    fn mode_at(&self, elapsed_secs: u64) -> LoadMode;

    /// Target logical queries per epoch at `elapsed_secs`
    fn rate_for(&self, base_rate: u64, elapsed_secs: u64) -> u64 {
        self.mode_at(elapsed_secs).rate(base_rate)
    }
}

impl LoadProfile for LoadMode {
    fn mode_at(&self, _elapsed_secs: u64) -> LoadMode {
        *self
    }
}

/// Profile selected from run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunProfile {
    /// One mode for the whole run
    Constant(LoadMode),
    /// Ordered mode segments
    Scheduled(Schedule),
}

impl RunProfile {
    /// Build from a blueprint: the schedule wins over `run.mode` when present
    pub fn from_blueprint(blueprint: &RunBlueprint) -> Result<Self, ContractError> {
        if blueprint.schedule.is_empty() {
            Ok(Self::Constant(blueprint.run.mode))
        } else {
            Schedule::new(blueprint.schedule.clone()).map(Self::Scheduled)
        }
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            RunProfile::Constant(mode) => mode.to_string(),
            RunProfile::Scheduled(schedule) => schedule.to_string(),
        }
    }
}

impl LoadProfile for RunProfile {
    fn mode_at(&self, elapsed_secs: u64) -> LoadMode {
        match self {
            RunProfile::Constant(mode) => *mode,
            RunProfile::Scheduled(schedule) => schedule.mode_at(elapsed_secs),
        }
    }
}

impl From<LoadMode> for RunProfile {
    fn from(mode: LoadMode) -> Self {
        Self::Constant(mode)
    }
}

impl From<Schedule> for RunProfile {
    fn from(schedule: Schedule) -> Self {
        Self::Scheduled(schedule)
    }
}
