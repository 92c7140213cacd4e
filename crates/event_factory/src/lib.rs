//! # Event Factory
//!
//! Synthetic query-event generation.
//!
//! Responsibilities:
//! - Expand a rate of logical queries into bursts of `QueryEvent`s
//! - Inject simulated errors and large queries on request
//! - Draw every random value from an injected, seedable source
//!
//! # Example
//!
//! ```
//! use event_factory::EventFactory;
//!
//! let mut factory = EventFactory::seeded(7);
//! let events: Vec<_> = factory.generate(1, false, false).collect();
//! assert_eq!(events.len(), 5);
//! ```

mod factory;

pub use factory::{
    Batch, EventFactory, ERROR_MESSAGE, ERROR_PROBABILITY, LARGE_QUERY_PROBABILITY,
};
