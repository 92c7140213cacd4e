//! RunBlueprint - Config Loader output
//!
//! Describes a complete run: load parameters, optional schedule, output sink.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::LoadMode;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete run blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Load parameters
    #[serde(default)]
    pub run: RunConfig,

    /// Ordered mode segments; replaces `run.mode` when not empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedule: Vec<SegmentConfig>,

    /// Output sink (may also come from the persisted sink store)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<SinkConfig>,
}

/// Load parameters of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Constant mode used when no schedule is configured
    #[serde(default)]
    pub mode: LoadMode,

    /// Logical queries per epoch at the steady level, must be > 0
    #[serde(default = "default_base_rate")]
    pub base_rate: u64,

    /// Number of epochs to run
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,

    /// Upper bound of concurrently in-flight sends, must be > 0
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Inject simulated query errors
    #[serde(default = "default_true")]
    pub include_errors: bool,

    /// Inject large (20 event) queries
    #[serde(default = "default_true")]
    pub large_queries: bool,

    /// Payload encoding
    #[serde(default)]
    pub format: PayloadFormat,

    /// Random seed (entropy when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: LoadMode::default(),
            base_rate: default_base_rate(),
            duration_secs: default_duration_secs(),
            max_in_flight: default_max_in_flight(),
            include_errors: true,
            large_queries: true,
            format: PayloadFormat::default(),
            seed: None,
        }
    }
}

fn default_base_rate() -> u64 {
    100
}

fn default_duration_secs() -> u64 {
    60
}

fn default_max_in_flight() -> usize {
    256
}

fn default_true() -> bool {
    true
}

/// One segment of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub mode: LoadMode,
    /// Must be > 0
    pub duration_secs: u64,
}

/// Payload encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// JSON (human-readable, larger)
    #[default]
    Json,
    /// Bincode (binary, compact)
    Bincode,
}

/// Sink output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// JSON lines file
    File,
    /// Network output (UDP)
    Network,
    /// In-memory buffer
    Memory,
}

impl SinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkType::Log => "log",
            SinkType::File => "file",
            SinkType::Network => "network",
            SinkType::Memory => "memory",
        }
    }
}

impl std::str::FromStr for SinkType {
    type Err = crate::ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "log" => Ok(SinkType::Log),
            "file" => Ok(SinkType::File),
            "network" | "udp" => Ok(SinkType::Network),
            "memory" => Ok(SinkType::Memory),
            other => Err(crate::ContractError::config_validation(
                "sink.sink_type",
                format!("unknown sink type '{other}'"),
            )),
        }
    }
}

impl RunBlueprint {
    /// Total number of epochs the run will execute
    pub fn total_epochs(&self) -> u64 {
        self.run.duration_secs
    }

    /// Sum of all schedule segment durations (0 without a schedule)
    pub fn schedule_secs(&self) -> u64 {
        self.schedule
            .iter()
            .map(|segment| segment.duration_secs)
            .fold(0u64, u64::saturating_add)
    }
}
