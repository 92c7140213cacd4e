//! Command implementations.

mod plan;
mod run;
mod validate;

pub use plan::run_plan;
pub use run::run_load;
pub use validate::run_validate;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::RunBlueprint;

use crate::cli::ProfileArgs;
use crate::error::CliError;

/// Load the run file (if any) and apply command-line overrides
///
/// An explicit mode on the command line replaces a schedule from the file;
/// an explicit `--schedule` always wins.
pub(crate) fn resolve_blueprint(args: &ProfileArgs) -> Result<RunBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path).into());
            }
            ConfigLoader::load_from_path(path)
                .map_err(CliError::from)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => RunBlueprint::default(),
    };

    if let Some(mode) = args.mode {
        blueprint.run.mode = mode;
        blueprint.schedule.clear();
    }
    if let Some(base_rate) = args.base_rate {
        blueprint.run.base_rate = base_rate;
    }
    if let Some(duration) = args.duration {
        blueprint.run.duration_secs = duration;
    }
    if let Some(schedule) = &args.schedule {
        blueprint.schedule = schedule.segments().to_vec();
    }

    ConfigLoader::validate(&blueprint).map_err(CliError::from)?;
    Ok(blueprint)
}
