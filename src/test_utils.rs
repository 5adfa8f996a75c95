//! Test utilities shared by unit tests
//!
//! Feeds built here start from the baseline catalog stamped at time 0.

use crate::core::baseline_instruments;
use crate::feed::{PriceFeed, RngSource, ScriptedSource};
use crate::gateway::Frame;
use rand::rngs::StdRng;

/// Feed whose every draw is the midpoint: prices hold, change decays
pub fn still_feed() -> PriceFeed<ScriptedSource> {
    PriceFeed::new(baseline_instruments(0), ScriptedSource::constant(0.5), 0.01)
}

/// Replayable random feed
pub fn seeded_feed(seed: u64) -> PriceFeed<RngSource<StdRng>> {
    PriceFeed::new(baseline_instruments(0), RngSource::seeded(seed), 0.01)
}

/// Decode an outbound frame for assertions
pub fn frame_json(frame: &Frame) -> serde_json::Value {
    serde_json::from_str(frame).expect("frame is valid JSON")
}
