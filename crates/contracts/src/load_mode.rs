//! LoadMode - named load profiles

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ContractError;

/// Operating mode of the load generator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Base rate
    #[default]
    Steady,
    /// Twice the base rate
    Burst,
    /// Nothing is emitted
    Outage,
    /// Back to the base rate after an outage
    Recovery,
}

impl LoadMode {
    /// Every mode, in declaration order
    pub const ALL: [LoadMode; 4] = [
        LoadMode::Steady,
        LoadMode::Burst,
        LoadMode::Outage,
        LoadMode::Recovery,
    ];

    /// Target rate for this mode given the base rate
    pub fn rate(&self, base_rate: u64) -> u64 {
        match self {
            LoadMode::Steady | LoadMode::Recovery => base_rate,
            LoadMode::Burst => base_rate.saturating_mul(2),
            LoadMode::Outage => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadMode::Steady => "steady",
            LoadMode::Burst => "burst",
            LoadMode::Outage => "outage",
            LoadMode::Recovery => "recovery",
        }
    }
}

impl std::fmt::Display for LoadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadMode {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "steady" => Ok(LoadMode::Steady),
            "burst" => Ok(LoadMode::Burst),
            "outage" => Ok(LoadMode::Outage),
            "recovery" => Ok(LoadMode::Recovery),
            other => Err(ContractError::config_validation(
                "mode",
                format!("unknown mode '{other}', valid options: steady, outage, burst, recovery"),
            )),
        }
    }
}
