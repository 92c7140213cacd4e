//! LogSink - logs payload summaries via tracing

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use contracts::{ContractError, EventSink};
use tracing::{info, instrument};

/// Longest payload prefix echoed into the log
const PREVIEW_BYTES: usize = 160;

/// Sink that logs payload summaries for debugging
pub struct LogSink {
    name: String,
    received: AtomicU64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            received: AtomicU64::new(0),
        }
    }

    /// Payloads logged so far
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    fn log_payload_summary(&self, payload: &[u8]) {
        let seq = self.received.fetch_add(1, Ordering::Relaxed);
        let preview = String::from_utf8_lossy(&payload[..payload.len().min(PREVIEW_BYTES)]);

        info!(
            sink = %self.name,
            seq,
            bytes = payload.len(),
            preview = %preview,
            "Event payload received"
        );
    }
}

impl EventSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_send",
        skip(self, payload),
        fields(sink = %self.name, bytes = payload.len())
    )]
    async fn send(&self, payload: Bytes) -> Result<(), ContractError> {
        self.log_payload_summary(&payload);
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&self) -> Result<(), ContractError> {
        info!(sink = %self.name, received = self.received(), "LogSink closed");
        Ok(())
    }
}
