//! EventFactory 核心实现
//!
//! 将逻辑查询速率展开为事件批次，所有随机数都来自注入的随机源。

use chrono::{DateTime, Utc};
use contracts::{
    EventPayload, EventType, QueryEvent, QueryMetadata, Stage, LARGE_BURST_SIZE,
    REGULAR_BURST_SIZE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Probability that a logical query is rendered as a large burst
pub const LARGE_QUERY_PROBABILITY: f64 = 0.1;

/// Probability that an event carries a simulated error
pub const ERROR_PROBABILITY: f64 = 0.1;

/// Error text attached by error injection
pub const ERROR_MESSAGE: &str = "Simulated query error";

/// Event Factory
///
/// Owns its random source; a batch borrows the factory mutably, so one
/// source is never driven by two batches at once.
pub struct EventFactory<R: Rng = StdRng> {
    rng: R,
    last_timestamp: Option<DateTime<Utc>>,
}

impl EventFactory<StdRng> {
    /// Factory with a deterministic `StdRng`
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Factory seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> EventFactory<R> {
    /// Create a factory around an injected random source
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            last_timestamp: None,
        }
    }

    /// Lazily generate `rate` logical query bursts
    ///
    /// Nothing is drawn until the returned iterator is polled.
    pub fn generate(&mut self, rate: u64, include_errors: bool, large_queries: bool) -> Batch<'_, R> {
        Batch {
            factory: self,
            remaining_bursts: rate,
            burst_size: 0,
            seq: 0,
            include_errors,
            large_queries,
        }
    }

    fn draw_burst_size(&mut self, large_queries: bool) -> usize {
        if large_queries && self.rng.random::<f64>() < LARGE_QUERY_PROBABILITY {
            LARGE_BURST_SIZE
        } else {
            REGULAR_BURST_SIZE
        }
    }

    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }

    fn build_event(&mut self, seq: u32, include_errors: bool) -> QueryEvent {
        let query_id = uuid::Builder::from_random_bytes(self.rng.random()).into_uuid();
        let timestamp = self.next_timestamp();
        let event_type = EventType::ALL[self.rng.random_range(0..EventType::ALL.len())];
        let row_id: u32 = self.rng.random_range(0..1000);

        let metadata = QueryMetadata {
            user_id: format!("user_{}", self.rng.random_range(1..100u32)),
            database: format!("db{}", self.rng.random_range(1..5u32)),
            duration_ms: self.rng.random_range(50..2000),
            rows_affected: self.rng.random_range(0..100),
            error: (include_errors && self.rng.random::<f64>() < ERROR_PROBABILITY)
                .then(|| ERROR_MESSAGE.to_string()),
        };

        QueryEvent {
            query_id,
            timestamp,
            event_type,
            query_text: format!("SELECT * FROM table WHERE id={row_id}"),
            metadata,
            payload: EventPayload {
                stage: Stage::Processing,
                seq,
            },
        }
    }
}

/// Lazy sequence of events for one epoch
pub struct Batch<'a, R: Rng> {
    factory: &'a mut EventFactory<R>,
    remaining_bursts: u64,
    burst_size: usize,
    seq: usize,
    include_errors: bool,
    large_queries: bool,
}

impl<R: Rng> Batch<'_, R> {
    /// Bursts not started yet
    pub fn remaining_bursts(&self) -> u64 {
        self.remaining_bursts
    }
}

impl<R: Rng> Iterator for Batch<'_, R> {
    type Item = QueryEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.seq >= self.burst_size {
            if self.remaining_bursts == 0 {
                return None;
            }
            self.remaining_bursts -= 1;
            self.burst_size = self.factory.draw_burst_size(self.large_queries);
            self.seq = 0;
        }

        let event = self
            .factory
            .build_event(self.seq as u32, self.include_errors);
        self.seq += 1;
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let in_burst = self.burst_size.saturating_sub(self.seq);
        let per_burst_max = if self.large_queries {
            LARGE_BURST_SIZE
        } else {
            REGULAR_BURST_SIZE
        };
        let remaining = usize::try_from(self.remaining_bursts).unwrap_or(usize::MAX);
        let lower = remaining
            .saturating_mul(REGULAR_BURST_SIZE)
            .saturating_add(in_burst);
        let upper = remaining
            .checked_mul(per_burst_max)
            .and_then(|n| n.checked_add(in_burst));
        (lower, upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Split a batch into bursts using the per-burst sequence number
    fn bursts(events: &[QueryEvent]) -> Vec<Vec<&QueryEvent>> {
        let mut bursts: Vec<Vec<&QueryEvent>> = Vec::new();
        for event in events {
            if event.starts_burst() {
                bursts.push(Vec::new());
            }
            bursts
                .last_mut()
                .expect("first event starts a burst")
                .push(event);
        }
        bursts
    }

    #[test]
    fn single_regular_query_yields_five_clean_events() {
        let mut factory = EventFactory::seeded(1);
        let events: Vec<_> = factory.generate(1, false, false).collect();

        assert_eq!(events.len(), 5);
        for (i, event) in events.iter().enumerate() {
            assert!(event.metadata.error.is_none());
            assert!(EventType::ALL.contains(&event.event_type));
            assert_eq!(event.payload.seq, i as u32);
            assert_eq!(event.payload.stage, Stage::Processing);
        }
    }

    #[test]
    fn zero_rate_yields_nothing() {
        let mut factory = EventFactory::seeded(1);
        assert_eq!(factory.generate(0, true, true).count(), 0);
    }

    #[test]
    fn no_errors_without_error_injection() {
        let mut factory = EventFactory::seeded(2);
        let events: Vec<_> = factory.generate(500, false, true).collect();
        assert!(events.iter().all(|e| e.metadata.error.is_none()));
    }

    #[test]
    fn error_injection_sets_error_on_some_events() {
        let mut factory = EventFactory::seeded(3);
        let events: Vec<_> = factory.generate(500, true, false).collect();
        let with_error = events
            .iter()
            .filter(|e| e.metadata.error.as_deref() == Some(ERROR_MESSAGE))
            .count();
        let fraction = with_error as f64 / events.len() as f64;
        assert!(
            (0.07..0.13).contains(&fraction),
            "error fraction {fraction} out of band"
        );
    }

    #[test]
    fn regular_bursts_have_five_events() {
        let mut factory = EventFactory::seeded(4);
        let events: Vec<_> = factory.generate(200, true, false).collect();
        let bursts = bursts(&events);
        assert_eq!(bursts.len(), 200);
        assert!(bursts.iter().all(|b| b.len() == REGULAR_BURST_SIZE));
    }

    #[test]
    fn large_burst_fraction_converges() {
        let mut factory = EventFactory::seeded(5);
        let events: Vec<_> = factory.generate(10_000, false, true).collect();
        let bursts = bursts(&events);
        assert_eq!(bursts.len(), 10_000);

        let large = bursts
            .iter()
            .filter(|b| b.len() == LARGE_BURST_SIZE)
            .count();
        assert!(bursts
            .iter()
            .all(|b| b.len() == LARGE_BURST_SIZE || b.len() == REGULAR_BURST_SIZE));

        let fraction = large as f64 / bursts.len() as f64;
        assert!(
            (0.08..0.12).contains(&fraction),
            "large burst fraction {fraction} out of band"
        );
    }

    #[test]
    fn field_ranges_hold() {
        let mut factory = EventFactory::seeded(6);
        for event in factory.generate(300, true, true) {
            let meta = &event.metadata;
            assert!((50..2000).contains(&meta.duration_ms));
            assert!(meta.rows_affected < 100);

            let user: u32 = meta.user_id.strip_prefix("user_").unwrap().parse().unwrap();
            assert!((1..100).contains(&user));
            let db: u32 = meta.database.strip_prefix("db").unwrap().parse().unwrap();
            assert!((1..5).contains(&db));

            let row: u32 = event
                .query_text
                .strip_prefix("SELECT * FROM table WHERE id=")
                .unwrap()
                .parse()
                .unwrap();
            assert!(row < 1000);
        }
    }

    #[test]
    fn every_event_type_is_drawn() {
        let mut factory = EventFactory::seeded(7);
        let seen: HashSet<_> = factory
            .generate(100, false, false)
            .map(|e| e.event_type)
            .collect();
        assert_eq!(seen.len(), EventType::ALL.len());
    }

    #[test]
    fn query_ids_are_unique_and_timestamps_non_decreasing() {
        let mut factory = EventFactory::seeded(8);
        let events: Vec<_> = factory.generate(400, false, true).collect();

        let ids: HashSet<_> = events.iter().map(|e| e.query_id).collect();
        assert_eq!(ids.len(), events.len());
        assert!(events
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp));
        assert!(events.iter().all(|e| e.query_id.get_version_num() == 4));
    }

    #[test]
    fn same_seed_reproduces_random_fields() {
        let strip = |e: QueryEvent| (e.query_id, e.event_type, e.query_text, e.metadata);
        let a: Vec<_> = EventFactory::seeded(9)
            .generate(20, true, true)
            .map(strip)
            .collect();
        let b: Vec<_> = EventFactory::seeded(9)
            .generate(20, true, true)
            .map(strip)
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn batch_is_lazy() {
        let mut factory = EventFactory::seeded(10);
        let mut batch = factory.generate(3, false, false);
        assert_eq!(batch.remaining_bursts(), 3);
        let first = batch.next().unwrap();
        assert!(first.starts_burst());
        assert_eq!(batch.remaining_bursts(), 2);
        assert_eq!(batch.size_hint(), (14, Some(14)));
    }

    #[test]
    fn events_serialize_to_json() {
        let mut factory = EventFactory::seeded(11);
        let event = factory.generate(1, false, false).next().unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["query_id"].is_string());
        assert!(json["metadata"]["error"].is_null());
    }
}
