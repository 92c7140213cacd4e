//! QueryEvent - EventFactory output, Dispatcher input
//!
//! One synthetic query-lifecycle telemetry record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of events in a regular logical query burst
pub const REGULAR_BURST_SIZE: usize = 5;

/// Number of events in a large logical query burst
pub const LARGE_BURST_SIZE: usize = 20;

/// Synthetic query lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvent {
    /// Unique per event within a run
    pub query_id: Uuid,

    /// Generation time, non-decreasing per factory
    pub timestamp: DateTime<Utc>,

    /// Lifecycle stage reported by the event
    pub event_type: EventType,

    /// Synthetic SQL text
    pub query_text: String,

    /// Execution metadata
    pub metadata: QueryMetadata,

    /// Generation-internal sequence info
    pub payload: EventPayload,
}

/// Event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Execution,
    Start,
    Completed,
    Failed,
    Scale,
}

impl EventType {
    /// Every event type, in a fixed order
    pub const ALL: [EventType; 5] = [
        EventType::Execution,
        EventType::Start,
        EventType::Completed,
        EventType::Failed,
        EventType::Scale,
    ];

    /// Wire name (upper-case)
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Execution => "EXECUTION",
            EventType::Start => "START",
            EventType::Completed => "COMPLETED",
            EventType::Failed => "FAILED",
            EventType::Scale => "SCALE",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query execution metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub user_id: String,
    pub database: String,
    /// In [50, 2000)
    pub duration_ms: u32,
    /// In [0, 100)
    pub rows_affected: u32,
    /// Only set by error injection
    pub error: Option<String>,
}

/// Position of an event inside its logical query burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub stage: Stage,
    /// 0-based index within the burst
    pub seq: u32,
}

/// Generation stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Processing,
}

impl QueryEvent {
    /// Whether this event starts a new burst
    pub fn starts_burst(&self) -> bool {
        self.payload.seq == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> QueryEvent {
        QueryEvent {
            query_id: Uuid::nil(),
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            event_type: EventType::Completed,
            query_text: "SELECT * FROM table WHERE id=7".into(),
            metadata: QueryMetadata {
                user_id: "user_3".into(),
                database: "db2".into(),
                duration_ms: 120,
                rows_affected: 4,
                error: None,
            },
            payload: EventPayload {
                stage: Stage::Processing,
                seq: 0,
            },
        }
    }

    #[test]
    fn event_serializes_with_wire_names() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(json["event_type"], "COMPLETED");
        assert_eq!(json["payload"]["stage"], "processing");
        assert_eq!(json["payload"]["seq"], 0);
        assert!(json["metadata"]["error"].is_null());
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn event_type_display_matches_serde() {
        for kind in EventType::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }
}
