//! Core types and algorithms for the Régua communication scheduler.
//!
//! Owns the entity types, the [`store::ScheduleStore`] abstraction, the
//! alternative-chain resolver and the flowchart synthesizer. No HTTP or
//! database code lives here; storage backends and the HTTP layer build on it.

pub mod catalog;
pub mod chain;
pub mod diagram;
pub mod error;
pub mod journey;
pub mod link;
pub mod rule;
pub mod schedule;
pub mod store;
pub mod theme;

pub use catalog::Catalog;
pub use error::{Error, Result};
