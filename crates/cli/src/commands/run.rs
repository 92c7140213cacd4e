//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::SinkStore;
use contracts::{RunBlueprint, SinkConfig};
use load_profile::RunProfile;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::resolve_blueprint;
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{LoadRun, LoadRunConfig};

/// Execute the `run` command
pub async fn run_load(args: &RunArgs) -> Result<()> {
    let mut blueprint = resolve_blueprint(&args.profile)?;
    apply_run_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint).map_err(CliError::from)?;

    let profile = RunProfile::from_blueprint(&blueprint).map_err(CliError::from)?;
    let sink = resolve_sink(args, &blueprint, !args.dry_run)?;

    info!(
        profile = %profile.describe(),
        base_rate = blueprint.run.base_rate,
        duration_secs = blueprint.run.duration_secs,
        sink = %sink.name,
        sink_type = sink.sink_type.as_str(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint, &profile, &sink);
        return Ok(());
    }

    let config = LoadRunConfig {
        blueprint,
        sink,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Setup graceful shutdown handler
    let cancel = CancellationToken::new();
    let signal_task = tokio::spawn(cancel_on_shutdown_signal(cancel.clone()));

    info!("Starting load run...");
    let run = LoadRun::new(config);
    let result = run.run(cancel).await;
    signal_task.abort();

    let summary = result.context("Load run failed")?;
    if summary.report.cancelled {
        warn!(
            epochs = summary.report.epoch_count(),
            "Run cancelled before all epochs completed"
        );
    }
    println!("{summary}");

    info!("loadgen finished");
    Ok(())
}

fn apply_run_overrides(blueprint: &mut RunBlueprint, args: &RunArgs) {
    let run = &mut blueprint.run;
    if let Some(max_in_flight) = args.max_in_flight {
        run.max_in_flight = max_in_flight;
    }
    if let Some(seed) = args.seed {
        run.seed = Some(seed);
    }
    if let Some(format) = args.format {
        run.format = format.into();
    }
    if args.no_errors {
        run.include_errors = false;
    }
    if args.no_large_queries {
        run.large_queries = false;
    }
}

/// Pick the sink: command line, then run file, then the sink store
///
/// A sink given on the command line is saved to the store when `persist`.
pub(crate) fn resolve_sink(
    args: &RunArgs,
    blueprint: &RunBlueprint,
    persist: bool,
) -> Result<SinkConfig, CliError> {
    let store = SinkStore::new(&args.sink_store);

    if let Some(sink_type) = args.sink_type {
        let config = SinkConfig {
            name: args
                .sink_name
                .clone()
                .unwrap_or_else(|| sink_type.as_str().to_string()),
            sink_type,
            params: args.sink_params.iter().cloned().collect(),
        };
        if persist {
            store.save(&config)?;
            info!(store = %store.path().display(), "Saved sink config");
        } else {
            config_loader::validate_sink(&config)?;
        }
        return Ok(config);
    }

    if let Some(sink) = &blueprint.sink {
        return Ok(sink.clone());
    }

    match store.load()? {
        Some(config) => {
            info!(store = %store.path().display(), "Loaded sink config");
            Ok(config)
        }
        None => Err(CliError::sink_missing(store.path())),
    }
}

/// Cancel the run on Ctrl+C or SIGTERM
async fn cancel_on_shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping after the current epoch...");
    cancel.cancel();
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RunBlueprint, profile: &RunProfile, sink: &SinkConfig) {
    let run = &blueprint.run;
    println!("\n=== Configuration Summary ===\n");
    println!("Load:");
    println!("  Profile: {}", profile.describe());
    println!("  Base rate: {} logical queries/epoch", run.base_rate);
    println!("  Duration: {}s", run.duration_secs);
    println!("  Max in flight: {}", run.max_in_flight);
    println!("  Errors: {}", run.include_errors);
    println!("  Large queries: {}", run.large_queries);
    println!("  Format: {:?}", run.format);
    if let Some(seed) = run.seed {
        println!("  Seed: {seed}");
    }

    println!("\nSink:");
    println!("  {} ({})", sink.name, sink.sink_type.as_str());
    let mut params: Vec<_> = sink.params.iter().collect();
    params.sort();
    for (key, value) in params {
        println!("    {key} = {value}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use contracts::SinkType;
    use std::collections::HashMap;

    fn run_args(extra: &[&str], store: &std::path::Path) -> RunArgs {
        let store = store.to_str().unwrap();
        let mut argv = vec!["loadgen", "run", "--sink-store", store];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn cli_sink_is_saved_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("sink.config.json");
        let blueprint = RunBlueprint::default();

        let first = run_args(
            &["--sink-type", "network", "--sink-param", "addr=127.0.0.1:9999"],
            &store,
        );
        let saved = resolve_sink(&first, &blueprint, true).unwrap();
        assert_eq!(saved.name, "network");
        assert!(store.exists());

        let second = run_args(&[], &store);
        let loaded = resolve_sink(&second, &blueprint, true).unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn dry_run_does_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("sink.config.json");
        let args = run_args(&["--sink-type", "log"], &store);

        resolve_sink(&args, &RunBlueprint::default(), false).unwrap();
        assert!(!store.exists());
    }

    #[test]
    fn run_file_sink_beats_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("sink.config.json");
        SinkStore::new(&store)
            .save(&SinkConfig {
                name: "stored".to_string(),
                sink_type: SinkType::Log,
                params: HashMap::new(),
            })
            .unwrap();

        let mut blueprint = RunBlueprint::default();
        blueprint.sink = Some(SinkConfig {
            name: "from_file".to_string(),
            sink_type: SinkType::Memory,
            params: HashMap::new(),
        });

        let args = run_args(&[], &store);
        assert_eq!(resolve_sink(&args, &blueprint, true).unwrap().name, "from_file");
    }

    #[test]
    fn missing_sink_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(&[], &dir.path().join("sink.config.json"));
        let err = resolve_sink(&args, &RunBlueprint::default(), true).unwrap_err();
        assert!(matches!(err, CliError::SinkMissing { .. }));
    }

    #[test]
    fn invalid_cli_sink_is_rejected_and_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("sink.config.json");
        let args = run_args(&["--sink-type", "network"], &store);

        let err = resolve_sink(&args, &RunBlueprint::default(), true).unwrap_err();
        assert!(matches!(err, CliError::ConfigValidation { .. }));
        assert!(!store.exists());
    }

    #[test]
    fn run_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(
            &[
                "--max-in-flight",
                "8",
                "--seed",
                "3",
                "--format",
                "bincode",
                "--no-errors",
                "--no-large-queries",
            ],
            &dir.path().join("s.json"),
        );
        let mut blueprint = RunBlueprint::default();
        apply_run_overrides(&mut blueprint, &args);
        assert_eq!(blueprint.run.max_in_flight, 8);
        assert_eq!(blueprint.run.seed, Some(3));
        assert_eq!(blueprint.run.format, contracts::PayloadFormat::Bincode);
        assert!(!blueprint.run.include_errors);
        assert!(!blueprint.run.large_queries);
    }
}
