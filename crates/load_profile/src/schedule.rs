//! Segmented load schedule.

use std::fmt;
use std::str::FromStr;

use contracts::{ContractError, LoadMode, SegmentConfig};

use crate::LoadProfile;

/// Ordered sequence of `(mode, duration)` segments
///
/// The active segment is chosen from the cumulative elapsed time. Once the
/// schedule is exhausted the last segment's mode stays active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    segments: Vec<SegmentConfig>,
    /// Exclusive end of each segment, in seconds since the start of the run
    ends: Vec<u64>,
}

impl Schedule {
    /// Create a schedule
    ///
    /// # Errors
    /// - no segments
    /// - a segment with `duration_secs == 0`
    pub fn new(segments: Vec<SegmentConfig>) -> Result<Self, ContractError> {
        if segments.is_empty() {
            return Err(ContractError::config_validation(
                "schedule",
                "schedule must contain at least one segment",
            ));
        }

        let mut ends = Vec::with_capacity(segments.len());
        let mut end = 0u64;
        for (idx, segment) in segments.iter().enumerate() {
            if segment.duration_secs == 0 {
                return Err(ContractError::config_validation(
                    format!("schedule[{idx}].duration_secs"),
                    "segment duration must be > 0",
                ));
            }
            end = end.saturating_add(segment.duration_secs);
            ends.push(end);
        }

        Ok(Self { segments, ends })
    }

    pub fn segments(&self) -> &[SegmentConfig] {
        &self.segments
    }

    /// Sum of all segment durations
    pub fn total_secs(&self) -> u64 {
        self.ends.last().copied().unwrap_or(0)
    }

    /// Index of the segment active at `elapsed_secs`
    pub fn segment_index_at(&self, elapsed_secs: u64) -> usize {
        let idx = self.ends.partition_point(|&end| end <= elapsed_secs);
        idx.min(self.segments.len() - 1)
    }
}

impl LoadProfile for Schedule {
    fn mode_at(&self, elapsed_secs: u64) -> LoadMode {
        self.segments[self.segment_index_at(elapsed_secs)].mode
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", segment.mode, segment.duration_secs)?;
        }
        Ok(())
    }
}

/// Parse `"steady:30,outage:30,recovery:30"`
impl FromStr for Schedule {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(segments)
    }
}

fn parse_segment(part: &str) -> Result<SegmentConfig, ContractError> {
    let (mode, secs) = part.split_once(':').ok_or_else(|| {
        ContractError::config_validation(
            "schedule",
            format!("segment '{}' must look like <mode>:<seconds>", part.trim()),
        )
    })?;

    let duration_secs = secs.trim().parse::<u64>().map_err(|e| {
        ContractError::config_validation(
            "schedule",
            format!("invalid duration '{}': {e}", secs.trim()),
        )
    })?;

    Ok(SegmentConfig {
        mode: mode.parse()?,
        duration_secs,
    })
}
