//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{LoadMode, RunBlueprint};
use load_profile::RunProfile;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    profile: String,
    base_rate: u64,
    duration_secs: u64,
    max_in_flight: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    sink: Option<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load, validate and build the profile
    let loaded = config_loader::ConfigLoader::load_from_path(&args.config).and_then(|bp| {
        let profile = RunProfile::from_blueprint(&bp)?;
        Ok((bp, profile))
    });

    match loaded {
        Ok((blueprint, profile)) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    profile: profile.describe(),
                    base_rate: blueprint.run.base_rate,
                    duration_secs: blueprint.run.duration_secs,
                    max_in_flight: blueprint.run.max_in_flight,
                    sink: blueprint
                        .sink
                        .as_ref()
                        .map(|s| format!("{} ({})", s.name, s.sink_type.as_str())),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RunBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sink.is_none() {
        warnings.push(
            "No [sink] configured - the run will use the sink store or --sink-type".to_string(),
        );
    }

    if blueprint.run.duration_secs == 0 {
        warnings.push("duration_secs is 0 - no epoch will run".to_string());
    }

    let scheduled = blueprint.schedule_secs();
    let duration = blueprint.run.duration_secs;
    if !blueprint.schedule.is_empty() {
        if scheduled < duration {
            warnings.push(format!(
                "schedule covers {scheduled}s of {duration}s - the last segment is held for the rest"
            ));
        } else if scheduled > duration {
            warnings.push(format!(
                "schedule covers {scheduled}s but the run lasts {duration}s - later segments never run"
            ));
        }
    }

    let only_outage = if blueprint.schedule.is_empty() {
        blueprint.run.mode == LoadMode::Outage
    } else {
        blueprint.schedule.iter().all(|s| s.mode == LoadMode::Outage)
    };
    if only_outage {
        warnings.push("profile is outage only - no events will be sent".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Profile: {}", summary.profile);
            println!("  Base rate: {}", summary.base_rate);
            println!("  Duration: {}s", summary.duration_secs);
            println!("  Max in flight: {}", summary.max_in_flight);
            if let Some(ref sink) = summary.sink {
                println!("  Sink: {}", sink);
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
