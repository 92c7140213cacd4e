//! `plan` command implementation.

use anyhow::{Context, Result};
use contracts::{LoadMode, RunBlueprint, LARGE_BURST_SIZE, REGULAR_BURST_SIZE};
use load_profile::{LoadProfile, RunProfile};
use serde::Serialize;
use tracing::info;

use super::resolve_blueprint;
use crate::cli::PlanArgs;
use crate::error::CliError;

/// Plan for JSON output
#[derive(Serialize, Debug)]
struct PlanInfo {
    profile: String,
    base_rate: u64,
    duration_secs: u64,
    rows: Vec<PlanRow>,
    totals: PlanTotals,
}

/// Consecutive epochs with the same mode and rate
#[derive(Serialize, Debug, PartialEq, Eq)]
struct PlanRow {
    first_epoch: u64,
    last_epoch: u64,
    mode: LoadMode,
    rate: u64,
}

#[derive(Serialize, Debug, Default, PartialEq, Eq)]
struct PlanTotals {
    logical_queries: u64,
    min_events: u64,
    max_events: u64,
}

/// Execute the `plan` command
pub fn run_plan(args: &PlanArgs) -> Result<()> {
    let blueprint = resolve_blueprint(&args.profile)?;
    let profile = RunProfile::from_blueprint(&blueprint).map_err(CliError::from)?;

    info!(profile = %profile.describe(), "Planning run");

    let plan = build_plan(&blueprint, &profile, args.per_epoch);

    if args.json {
        let json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
        println!("{}", json);
    } else {
        print_plan(&plan);
    }

    Ok(())
}

fn build_plan(blueprint: &RunBlueprint, profile: &RunProfile, per_epoch: bool) -> PlanInfo {
    let base_rate = blueprint.run.base_rate;
    let max_burst = if blueprint.run.large_queries {
        LARGE_BURST_SIZE as u64
    } else {
        REGULAR_BURST_SIZE as u64
    };

    let mut rows: Vec<PlanRow> = Vec::new();
    let mut totals = PlanTotals::default();

    for epoch in 0..blueprint.run.duration_secs {
        let mode = profile.mode_at(epoch);
        let rate = profile.rate_for(base_rate, epoch);

        totals.logical_queries = totals.logical_queries.saturating_add(rate);
        totals.min_events = totals
            .min_events
            .saturating_add(rate.saturating_mul(REGULAR_BURST_SIZE as u64));
        totals.max_events = totals
            .max_events
            .saturating_add(rate.saturating_mul(max_burst));

        match rows.last_mut() {
            Some(row) if !per_epoch && row.mode == mode && row.rate == rate => {
                row.last_epoch = epoch;
            }
            _ => rows.push(PlanRow {
                first_epoch: epoch,
                last_epoch: epoch,
                mode,
                rate,
            }),
        }
    }

    PlanInfo {
        profile: profile.describe(),
        base_rate,
        duration_secs: blueprint.run.duration_secs,
        rows,
        totals,
    }
}

fn print_plan(plan: &PlanInfo) {
    println!("\n=== Load Plan ===\n");
    println!("Profile: {}", plan.profile);
    println!("Base rate: {}", plan.base_rate);
    println!("Duration: {}s\n", plan.duration_secs);

    println!("{:<15} {:<10} {:>8}", "Epochs", "Mode", "Rate");
    for row in &plan.rows {
        let epochs = if row.first_epoch == row.last_epoch {
            row.first_epoch.to_string()
        } else {
            format!("{}-{}", row.first_epoch, row.last_epoch)
        };
        println!("{:<15} {:<10} {:>8}", epochs, row.mode.as_str(), row.rate);
    }

    println!(
        "\nLogical queries: {}  Events: {}..{}",
        plan.totals.logical_queries, plan.totals.min_events, plan.totals.max_events
    );
    println!();
}
