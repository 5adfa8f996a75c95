//! Price feed - the single writer of instrument state
//!
//! - random_walk: per-instrument step and random sources
//! - publisher: owns the instrument set and applies ticks

pub mod publisher;
pub mod random_walk;

pub use publisher::{InstrumentSet, PriceBook, PriceFeed, TickReport};
pub use random_walk::{RandomSource, RngSource, ScriptedSource, StepError};
