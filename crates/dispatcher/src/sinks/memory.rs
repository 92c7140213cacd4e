//! MemorySink - keeps payloads in memory

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use contracts::{ContractError, EventSink};
use tracing::{debug, instrument};

/// Sink that stores every accepted payload (tests, dry runs)
#[derive(Debug, Default)]
pub struct MemorySink {
    name: String,
    max_payload_bytes: Option<usize>,
    payloads: Mutex<Vec<Bytes>>,
    closed: AtomicBool,
}

impl MemorySink {
    /// Create an unbounded MemorySink
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Reject payloads larger than `limit` bytes as oversized
    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = Some(limit);
        self
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let sink = Self::new(name);
        match params.get("max_payload_bytes") {
            Some(raw) => {
                let limit = raw.parse().map_err(|e| {
                    ContractError::config_validation(
                        "sink.params.max_payload_bytes",
                        format!("invalid limit '{raw}': {e}"),
                    )
                })?;
                Ok(sink.with_max_payload_bytes(limit))
            }
            None => Ok(sink),
        }
    }

    /// Snapshot of the stored payloads
    pub fn payloads(&self) -> Vec<Bytes> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Bytes>> {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, payload: Bytes) -> Result<(), ContractError> {
        if self.is_closed() {
            return Err(ContractError::sink_write(&self.name, "sink closed"));
        }
        if let Some(limit) = self.max_payload_bytes {
            if payload.len() > limit {
                return Err(ContractError::oversized(&self.name, payload.len(), limit));
            }
        }
        self.lock().push(payload);
        Ok(())
    }

    #[instrument(name = "memory_sink_close", skip(self))]
    async fn close(&self) -> Result<(), ContractError> {
        self.closed.store(true, Ordering::Release);
        debug!(sink = %self.name, stored = self.len(), "MemorySink closed");
        Ok(())
    }
}
