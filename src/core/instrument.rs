//! Instrument types
//!
//! `Instrument` is the full record carried by every `price-update` broadcast.
//! `InstrumentSnapshot` is the reduced record sent once in the `connected`
//! reply (no `volume`, no `timestamp`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset class of an instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    Crypto,
    Forex,
    Index,
    Mineral,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Crypto => "CRYPTO",
            AssetClass::Forex => "FOREX",
            AssetClass::Index => "INDEX",
            AssetClass::Mineral => "MINERAL",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tradable asset with its current quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Stable identity key ("BTC", "EUR/USD", ...)
    pub symbol: String,
    /// Display label
    pub name: String,
    /// Asset class, never changes
    pub class: AssetClass,
    /// Current quote, strictly positive
    pub price: f64,
    /// Decaying accumulation of per-tick deltas
    pub change: f64,
    /// `change / price * 100`, recomputed on every tick
    pub change_percent: f64,
    /// Static placeholder, never touched by the feed
    pub volume: f64,
    /// Last update (Unix millis)
    pub timestamp: u64,
}

/// Reduced record for the one-time `connected` reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentSnapshot {
    pub symbol: String,
    pub name: String,
    pub class: AssetClass,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl From<&Instrument> for InstrumentSnapshot {
    fn from(instrument: &Instrument) -> Self {
        Self {
            symbol: instrument.symbol.clone(),
            name: instrument.name.clone(),
            class: instrument.class,
            price: instrument.price,
            change: instrument.change,
            change_percent: instrument.change_percent,
        }
    }
}

impl Instrument {
    /// Create a new instrument at its baseline quote
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        class: AssetClass,
        price: f64,
        change: f64,
        change_percent: f64,
        volume: f64,
        timestamp: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            class,
            price,
            change,
            change_percent,
            volume,
            timestamp,
        }
    }
}

/// Round to 2 decimal places, halves away from zero
///
/// Never returns negative zero; it would serialize as `-0.0`.
#[inline]
pub fn round_dp2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

/// `change / price * 100` at display precision
#[inline]
pub fn change_percent(change: f64, price: f64) -> f64 {
    round_dp2(change / price * 100.0)
}

/// Current wall-clock time in Unix millis
#[inline]
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
