//! Pacing between epochs

use std::time::Duration;

/// Waits out the remainder of an epoch
///
/// The dispatch loop only asks for strictly positive durations; an epoch
/// that used up its whole budget is not paced at all.
#[trait_variant::make(Pacer: Send)]
pub trait LocalPacer {
    async fn pace(&self, remaining: Duration);
}

/// Pacer backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    async fn pace(&self, remaining: Duration) {
        tokio::time::sleep(remaining).await;
    }
}
