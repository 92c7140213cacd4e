//! Load run orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{LoadRun, LoadRunConfig};
pub use stats::RunSummary;
