//! Load run orchestrator - wires profile, sink and dispatch loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use contracts::{EventSink, RunBlueprint, SinkConfig};
use dispatcher::{create_sink, AnySink, DispatchConfig, DispatchLoopBuilder, RunReport};
use load_profile::RunProfile;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::RunSummary;

/// Load run configuration
#[derive(Debug, Clone)]
pub struct LoadRunConfig {
    /// Validated run blueprint
    pub blueprint: RunBlueprint,

    /// Resolved sink (command line, run file or store)
    pub sink: SinkConfig,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Owns the sink for the duration of one run
pub struct LoadRun {
    config: LoadRunConfig,
}

impl LoadRun {
    /// Create a new run with the given configuration
    pub fn new(config: LoadRunConfig) -> Self {
        Self { config }
    }

    /// Run to completion or until `cancel` fires
    ///
    /// The sink is closed afterwards whatever the outcome of the loop.
    pub async fn run(self, cancel: CancellationToken) -> Result<RunSummary> {
        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let profile = RunProfile::from_blueprint(&self.config.blueprint)
            .context("Invalid load schedule")?;

        let sink = Arc::new(
            create_sink(&self.config.sink)
                .await
                .with_context(|| format!("Failed to create sink '{}'", self.config.sink.name))?,
        );

        self.run_with_sink(sink, profile, cancel).await
    }

    /// Dispatch into an already created sink, then close it
    async fn run_with_sink(
        &self,
        sink: Arc<AnySink>,
        profile: RunProfile,
        cancel: CancellationToken,
    ) -> Result<RunSummary> {
        let result = self.dispatch(Arc::clone(&sink), profile.clone(), cancel).await;

        if let Err(e) = sink.close().await {
            warn!(sink = %sink.name(), error = %e, "Failed to close sink");
        } else {
            info!(sink = %sink.name(), "Sink closed");
        }

        let report = result?;
        Ok(RunSummary::new(
            report,
            profile.describe(),
            self.config.sink.clone(),
        ))
    }

    async fn dispatch(
        &self,
        sink: Arc<AnySink>,
        profile: RunProfile,
        cancel: CancellationToken,
    ) -> Result<RunReport> {
        let mut dispatch = DispatchLoopBuilder::new(sink, profile)
            .config(DispatchConfig::from(&self.config.blueprint.run))
            .cancellation(cancel)
            .build()
            .context("Invalid dispatch configuration")?;

        Ok(dispatch.run().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{LoadMode, SinkType};
    use dispatcher::MemorySink;
    use std::collections::HashMap;

    fn config(sink_type: SinkType, params: HashMap<String, String>) -> LoadRunConfig {
        let mut blueprint = RunBlueprint::default();
        blueprint.run.mode = LoadMode::Steady;
        blueprint.run.base_rate = 2;
        blueprint.run.duration_secs = 2;
        blueprint.run.large_queries = false;
        blueprint.run.seed = Some(1);
        LoadRunConfig {
            blueprint,
            sink: SinkConfig {
                name: "out".to_string(),
                sink_type,
                params,
            },
            metrics_port: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn run_writes_events_and_closes_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let params = HashMap::from([("path".to_string(), path.display().to_string())]);

        let summary = LoadRun::new(config(SinkType::File, params))
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.report.epoch_count(), 2);
        assert_eq!(summary.report.totals().sent, 20);
        // close flushed the buffered writer
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 20);
    }

    #[tokio::test]
    async fn sink_creation_failure_is_reported() {
        let result = LoadRun::new(config(SinkType::Network, HashMap::new()))
            .run(CancellationToken::new())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn invalid_dispatch_config_still_closes_sink() {
        let mut config = config(SinkType::Memory, HashMap::new());
        config.blueprint.run.max_in_flight = 0;
        let profile = RunProfile::from_blueprint(&config.blueprint).unwrap();
        let sink = Arc::new(AnySink::Memory(MemorySink::new("out")));

        let result = LoadRun::new(config)
            .run_with_sink(Arc::clone(&sink), profile, CancellationToken::new())
            .await;

        assert!(result.is_err());
        let AnySink::Memory(memory) = sink.as_ref() else {
            panic!("expected memory sink");
        };
        assert!(memory.is_closed());
        assert!(memory.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn completed_run_closes_sink() {
        let config = config(SinkType::Memory, HashMap::new());
        let profile = RunProfile::from_blueprint(&config.blueprint).unwrap();
        let sink = Arc::new(AnySink::Memory(MemorySink::new("out")));

        let summary = LoadRun::new(config)
            .run_with_sink(Arc::clone(&sink), profile, CancellationToken::new())
            .await
            .unwrap();

        let AnySink::Memory(memory) = sink.as_ref() else {
            panic!("expected memory sink");
        };
        assert!(memory.is_closed());
        assert_eq!(memory.len() as u64, summary.report.totals().sent);
    }
}
