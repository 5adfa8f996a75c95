//! Random-walk step for a single instrument
//!
//! Each tick moves the price by a uniform percentage in (-0.1%, +0.1%) and
//! folds the move into a decaying `change` accumulator:
//!
//! ```text
//! delta     = (unit - 0.5) * 0.2            // percent
//! new_price = price * (1 + delta / 100)
//! change    = (new_price - price) + 0.99 * previous_change
//! ```
//!
//! Random input is abstracted behind [`RandomSource`] so a tick can be
//! replayed from a seed or a scripted sequence.

use crate::core::{change_percent, round_dp2, Instrument};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use thiserror::Error;

/// Width of the percentage band a single tick can move the price
pub const STEP_BAND_PERCENT: f64 = 0.2;

/// Fraction of the previous `change` carried into the next tick
pub const CHANGE_DECAY: f64 = 0.99;

/// Source of uniform values in [0, 1)
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// [`RandomSource`] backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Deterministic source for replayable runs
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Source seeded from the OS
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed sequence of units, then a constant fallback
///
/// Fallback of 0.5 means "no move".
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    units: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedSource {
    pub fn new(units: impl IntoIterator<Item = f64>) -> Self {
        Self {
            units: units.into_iter().collect(),
            fallback: 0.5,
        }
    }

    /// Source that always returns `unit`
    pub fn constant(unit: f64) -> Self {
        Self {
            units: VecDeque::new(),
            fallback: unit,
        }
    }

    pub fn remaining(&self) -> usize {
        self.units.len()
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        self.units.pop_front().unwrap_or(self.fallback)
    }
}

/// Per-instrument step failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error("non-finite {field} for {symbol}")]
    NonFinite { symbol: String, field: &'static str },
}

/// Percentage move for a uniform draw
#[inline]
pub fn percent_delta(unit: f64) -> f64 {
    (unit - 0.5) * STEP_BAND_PERCENT
}

/// Advance one instrument by one tick
///
/// `floor` is the lowest price the walk may reach; a new price below it is
/// clamped before `change` is computed. The returned timestamp never goes
/// backwards.
pub fn step(prev: &Instrument, unit: f64, now_ms: u64, floor: f64) -> Result<Instrument, StepError> {
    let delta = percent_delta(unit);
    let raw_price = prev.price * (1.0 + delta / 100.0);
    ensure_finite(&prev.symbol, "price", raw_price)?;

    // change accumulates the unrounded move unless the floor kicked in
    let rounded = round_dp2(raw_price);
    let (price, moved) = if rounded < floor {
        (floor, floor - prev.price)
    } else {
        (rounded, raw_price - prev.price)
    };
    let change = round_dp2(moved + CHANGE_DECAY * prev.change);
    ensure_finite(&prev.symbol, "change", change)?;

    let change_percent = change_percent(change, price);
    ensure_finite(&prev.symbol, "changePercent", change_percent)?;

    Ok(Instrument {
        price,
        change,
        change_percent,
        timestamp: now_ms.max(prev.timestamp),
        ..prev.clone()
    })
}

#[inline]
fn ensure_finite(symbol: &str, field: &'static str, value: f64) -> Result<(), StepError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(StepError::NonFinite {
            symbol: symbol.to_string(),
            field,
        })
    }
}
