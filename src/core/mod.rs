//! Core types for the price feed
//!
//! - Instrument: full quote record broadcast on every tick
//! - InstrumentSnapshot: reduced record for the subscribe reply
//! - catalog: the fixed baseline symbol set

pub mod catalog;
pub mod instrument;

pub use catalog::baseline_instruments;
pub use instrument::{change_percent, now_millis, round_dp2, AssetClass, Instrument, InstrumentSnapshot};
