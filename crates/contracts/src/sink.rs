//! EventSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use bytes::Bytes;

use crate::ContractError;

/// Event output trait
///
/// All sink implementations must implement this trait. `send` takes `&self`
/// because the dispatcher keeps many sends to the same sink in flight at once.
#[trait_variant::make(EventSink: Send)]
pub trait LocalEventSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Send one encoded event
    ///
    /// # Errors
    /// - `ContractError::OversizedPayload` when the payload exceeds the transport limit
    ///   (the payload is skipped, nothing was sent)
    /// - any other variant for a failed send (should include context)
    async fn send(&self, payload: Bytes) -> Result<(), ContractError>;

    /// Release transport resources
    async fn close(&self) -> Result<(), ContractError>;
}

/// Settled state of one send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendStatus {
    /// Accepted by the sink
    Sent,
    /// Skipped as oversized (recoverable no-op)
    Skipped,
    /// Failed for any other reason
    Failed,
}

impl SendStatus {
    /// Classify the result of `EventSink::send`
    pub fn of(result: &Result<(), ContractError>) -> Self {
        match result {
            Ok(()) => SendStatus::Sent,
            Err(e) if e.is_oversized() => SendStatus::Skipped,
            Err(_) => SendStatus::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SendStatus::Sent => "sent",
            SendStatus::Skipped => "skipped",
            SendStatus::Failed => "failed",
        }
    }
}
