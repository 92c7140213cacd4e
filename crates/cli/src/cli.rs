//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{LoadMode, PayloadFormat, SinkType};
use load_profile::Schedule;
use std::path::PathBuf;

/// loadgen - query event load generator
#[derive(Parser, Debug)]
#[command(
    name = "loadgen",
    author,
    version,
    about = "Synthetic query event load generator",
    long_about = "Generates synthetic database query lifecycle events and streams them to a sink.\n\n\
                  Each second-long epoch emits a number of logical queries given by the load \n\
                  mode (steady, burst, outage, recovery) or a schedule of modes, sends every \n\
                  event concurrently, and waits for all sends before the next epoch."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LOADGEN_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LOADGEN_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate load and stream events to the sink
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Print the per-epoch mode and rate plan without sending anything
    Plan(PlanArgs),
}

/// Load shape shared by `run` and `plan`
#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    /// Load mode: steady, burst, outage, recovery [default: steady]
    pub mode: Option<LoadMode>,

    /// Logical queries per epoch at the steady level [default: 100]
    pub base_rate: Option<u64>,

    /// Run duration in seconds (one epoch per second) [default: 60]
    pub duration: Option<u64>,

    /// Run configuration file (TOML or JSON)
    #[arg(short, long, env = "LOADGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mode schedule, e.g. "steady:30,outage:30,recovery:30"
    #[arg(long, env = "LOADGEN_SCHEDULE")]
    pub schedule: Option<Schedule>,
}

/// Arguments for the `run` command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Sink type; saves the sink to the store for later runs
    #[arg(long, env = "LOADGEN_SINK_TYPE")]
    pub sink_type: Option<SinkType>,

    /// Sink name [default: the sink type]
    #[arg(long, requires = "sink_type")]
    pub sink_name: Option<String>,

    /// Sink parameter as key=value (repeatable), e.g. addr=127.0.0.1:9999
    #[arg(long = "sink-param", value_parser = parse_key_val, requires = "sink_type")]
    pub sink_params: Vec<(String, String)>,

    /// File the sink configuration is persisted to
    #[arg(long, default_value = config_loader::DEFAULT_SINK_STORE, env = "LOADGEN_SINK_STORE")]
    pub sink_store: PathBuf,

    /// Upper bound of concurrently in-flight sends
    #[arg(long, env = "LOADGEN_MAX_IN_FLIGHT")]
    pub max_in_flight: Option<usize>,

    /// Random seed for reproducible event content
    #[arg(long, env = "LOADGEN_SEED")]
    pub seed: Option<u64>,

    /// Payload encoding
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Do not inject simulated query errors
    #[arg(long)]
    pub no_errors: bool,

    /// Do not generate large (20 event) queries
    #[arg(long)]
    pub no_large_queries: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "LOADGEN_METRICS_PORT")]
    pub metrics_port: u16,

    /// Resolve configuration and sink, print the plan and exit without sending
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "loadgen.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `plan` command
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// One row per epoch instead of one per mode segment
    #[arg(long)]
    pub per_epoch: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

/// Payload encoding
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Json,
    Bincode,
}

impl From<FormatArg> for PayloadFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => PayloadFormat::Json,
            FormatArg::Bincode => PayloadFormat::Bincode,
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{s}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
