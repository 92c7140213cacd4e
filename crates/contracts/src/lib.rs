//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the load generator.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Rate Model
//! - A rate counts *logical queries* per epoch, each rendered as a burst of 5 or 20 events
//! - One epoch is one second of wall-clock time unless configured otherwise

mod blueprint;
mod error;
mod event;
mod load_mode;
mod sink;

pub use blueprint::*;
pub use error::*;
pub use event::*;
pub use load_mode::LoadMode;
pub use sink::*;
