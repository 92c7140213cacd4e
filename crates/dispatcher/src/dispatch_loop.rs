//! DispatchLoop - epoch-paced fan-out of generated events to a sink

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use contracts::{EventSink, PayloadFormat, RunConfig, SendStatus};
use event_factory::EventFactory;
use load_profile::LoadProfile;
use observability::{record_epoch, record_overrun, record_send};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::codec::encode_event;
use crate::error::DispatcherError;
use crate::metrics::InFlightMetrics;
use crate::pacer::{Pacer, TokioPacer};
use crate::report::{EpochReport, RunReport, SendTally};

/// Dispatch loop configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Logical queries per epoch at the steady level
    pub base_rate: u64,
    /// Number of epochs to run
    pub duration_secs: u64,
    /// Length of one epoch
    pub epoch: Duration,
    /// Upper bound of sends awaiting the sink at once
    pub max_in_flight: usize,
    pub include_errors: bool,
    pub large_queries: bool,
    pub format: PayloadFormat,
    /// Seed for the default factory (entropy when absent)
    pub seed: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_rate: 100,
            duration_secs: 60,
            epoch: Duration::from_secs(1),
            max_in_flight: 256,
            include_errors: true,
            large_queries: true,
            format: PayloadFormat::Json,
            seed: None,
        }
    }
}

impl From<&RunConfig> for DispatchConfig {
    fn from(run: &RunConfig) -> Self {
        Self {
            base_rate: run.base_rate,
            duration_secs: run.duration_secs,
            max_in_flight: run.max_in_flight,
            include_errors: run.include_errors,
            large_queries: run.large_queries,
            format: run.format,
            seed: run.seed,
            ..Default::default()
        }
    }
}

/// Builder for creating a DispatchLoop
pub struct DispatchLoopBuilder<S, P, Z = TokioPacer> {
    sink: Arc<S>,
    profile: P,
    config: DispatchConfig,
    factory: Option<EventFactory>,
    pacer: Z,
    cancel: CancellationToken,
}

impl<S, P> DispatchLoopBuilder<S, P, TokioPacer>
where
    S: EventSink + Sync + 'static,
    P: LoadProfile,
{
    /// Create a builder with the default config and the tokio pacer
    pub fn new(sink: Arc<S>, profile: P) -> Self {
        Self {
            sink,
            profile,
            config: DispatchConfig::default(),
            factory: None,
            pacer: TokioPacer,
            cancel: CancellationToken::new(),
        }
    }
}

impl<S, P, Z> DispatchLoopBuilder<S, P, Z>
where
    S: EventSink + Sync + 'static,
    P: LoadProfile,
    Z: Pacer,
{
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an explicit factory instead of one seeded from `config.seed`
    pub fn factory(mut self, factory: EventFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn pacer<Z2: Pacer>(self, pacer: Z2) -> DispatchLoopBuilder<S, P, Z2> {
        DispatchLoopBuilder {
            sink: self.sink,
            profile: self.profile,
            config: self.config,
            factory: self.factory,
            pacer,
            cancel: self.cancel,
        }
    }

    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validate the config and build the loop
    pub fn build(self) -> Result<DispatchLoop<S, P, Z>, DispatcherError> {
        if self.config.max_in_flight == 0 {
            return Err(DispatcherError::invalid_config(
                "max_in_flight",
                "must be greater than 0",
            ));
        }
        if self.config.max_in_flight > Semaphore::MAX_PERMITS {
            return Err(DispatcherError::invalid_config(
                "max_in_flight",
                format!("must not exceed {}", Semaphore::MAX_PERMITS),
            ));
        }
        if self.config.epoch.is_zero() {
            return Err(DispatcherError::invalid_config(
                "epoch",
                "epoch length must be non-zero",
            ));
        }

        let factory = self.factory.unwrap_or_else(|| match self.config.seed {
            Some(seed) => EventFactory::seeded(seed),
            None => EventFactory::from_entropy(),
        });

        Ok(DispatchLoop {
            semaphore: Arc::new(Semaphore::new(self.config.max_in_flight)),
            metrics: Arc::new(InFlightMetrics::new()),
            sink: self.sink,
            profile: self.profile,
            config: self.config,
            factory,
            pacer: self.pacer,
            cancel: self.cancel,
        })
    }
}

/// Drives one run: per epoch generate, send, drain, pace
///
/// The loop borrows the sink for the duration of the run and never closes
/// it; closing is the owner's job.
pub struct DispatchLoop<S, P, Z = TokioPacer> {
    sink: Arc<S>,
    profile: P,
    config: DispatchConfig,
    factory: EventFactory,
    pacer: Z,
    cancel: CancellationToken,
    semaphore: Arc<Semaphore>,
    metrics: Arc<InFlightMetrics>,
}

impl<S, P, Z> DispatchLoop<S, P, Z>
where
    S: EventSink + Sync + 'static,
    P: LoadProfile,
    Z: Pacer,
{
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// In-flight counters shared with the send tasks
    pub fn metrics(&self) -> &Arc<InFlightMetrics> {
        &self.metrics
    }

    /// Token that stops the run between epochs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run every epoch, or until cancelled
    #[instrument(
        name = "dispatch_loop_run",
        skip(self),
        fields(
            sink = %self.sink.name(),
            base_rate = self.config.base_rate,
            duration_secs = self.config.duration_secs
        )
    )]
    pub async fn run(&mut self) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::default();
        let total = self.config.duration_secs;

        info!(max_in_flight = self.config.max_in_flight, "Dispatch loop started");

        for index in 0..total {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let epoch_start = Instant::now();
            let mode = self.profile.mode_at(index);
            let rate = self.profile.rate_for(self.config.base_rate, index);

            let tally = self.run_epoch(index, rate).await;

            let elapsed = epoch_start.elapsed();
            let remaining = self.config.epoch.saturating_sub(elapsed);
            let overrun = remaining.is_zero();

            info!(
                epoch = index,
                time = %Utc::now().to_rfc3339(),
                mode = %mode,
                rate,
                dispatched = tally.total(),
                sent = tally.sent,
                skipped = tally.skipped,
                failed = tally.failed,
                "Epoch complete"
            );
            record_epoch(
                mode,
                rate,
                tally.total(),
                elapsed.as_secs_f64() * 1000.0,
            );
            if overrun {
                record_overrun();
                warn!(
                    epoch = index,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Epoch overran its budget, next epoch starts immediately"
                );
            }

            report.push_epoch(EpochReport {
                index,
                mode,
                rate,
                tally,
                elapsed,
                overrun,
            });

            if overrun {
                continue;
            }
            tokio::select! {
                _ = self.pacer.pace(remaining) => {}
                _ = self.cancel.cancelled() => {
                    report.cancelled = index + 1 < total;
                    break;
                }
            }
        }

        report.duration = started.elapsed();
        info!(
            epochs = report.epoch_count(),
            dispatched = report.stats.dispatched,
            overruns = report.overruns(),
            cancelled = report.cancelled,
            duration_ms = report.duration.as_millis() as u64,
            "Dispatch loop finished"
        );
        report
    }

    /// Send one epoch's batch and wait for every send to settle
    async fn run_epoch(&mut self, index: u64, rate: u64) -> SendTally {
        let mut tally = SendTally::default();
        let mut sends = JoinSet::new();
        let sink_name = self.sink.name().to_string();
        let format = self.config.format;

        let batch = self
            .factory
            .generate(rate, self.config.include_errors, self.config.large_queries);

        for event in batch {
            let payload = match encode_event(&event, format) {
                Ok(payload) => payload,
                Err(e) => {
                    error!(epoch = index, query_id = %event.query_id, error = %e, "Encode failed");
                    settle(&mut tally, &sink_name, SendStatus::Failed);
                    continue;
                }
            };

            // Admission only; the send itself runs on its own task
            let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(epoch = index, error = %e, "Send admission failed");
                    settle(&mut tally, &sink_name, SendStatus::Failed);
                    continue;
                }
            };
            let guard = self.metrics.enter();
            let sink = Arc::clone(&self.sink);
            sends.spawn(async move {
                let result = sink.send(payload).await;
                drop(guard);
                drop(permit);
                result
            });

            while let Some(joined) = sends.try_join_next() {
                settle(&mut tally, &sink_name, classify(&sink_name, index, joined));
            }
        }

        // Barrier: nothing from this epoch outlives it
        while let Some(joined) = sends.join_next().await {
            settle(&mut tally, &sink_name, classify(&sink_name, index, joined));
        }

        debug!(epoch = index, peak_in_flight = self.metrics.peak(), "Epoch drained");
        tally
    }
}

fn settle(tally: &mut SendTally, sink_name: &str, status: SendStatus) {
    tally.record(status);
    record_send(sink_name, status);
}

fn classify(
    sink_name: &str,
    epoch: u64,
    joined: Result<Result<(), contracts::ContractError>, JoinError>,
) -> SendStatus {
    match joined {
        Ok(result) => {
            let status = SendStatus::of(&result);
            match (&status, result) {
                (SendStatus::Skipped, Err(e)) => {
                    warn!(sink = %sink_name, epoch, error = %e, "Send skipped")
                }
                (SendStatus::Failed, Err(e)) => {
                    error!(sink = %sink_name, epoch, error = %e, "Send failed")
                }
                _ => {}
            }
            status
        }
        Err(e) => {
            error!(sink = %sink_name, epoch, error = %e, "Send task aborted");
            SendStatus::Failed
        }
    }
}
