//! Baseline instrument catalog
//!
//! The fixed symbol set the feed is seeded with on every start.

use super::{AssetClass, Instrument};

/// Build the baseline instrument set, all stamped with `timestamp`
pub fn baseline_instruments(timestamp: u64) -> Vec<Instrument> {
    use AssetClass::*;

    vec![
        Instrument::new("BTC", "Bitcoin", Crypto, 67234.50, 2234.50, 3.44, 28_500_000_000.0, timestamp),
        Instrument::new("ETH", "Ethereum", Crypto, 3456.78, 56.78, 1.67, 15_000_000_000.0, timestamp),
        Instrument::new("EUR/USD", "Euro/US Dollar", Forex, 1.0845, -0.0055, -0.50, 500_000_000_000.0, timestamp),
        Instrument::new("GBP/USD", "British Pound/US Dollar", Forex, 1.2678, -0.0022, -0.17, 350_000_000_000.0, timestamp),
        Instrument::new("S&P 500", "S&P 500 Index", Index, 5234.56, 34.56, 0.66, 2_000_000_000.0, timestamp),
        Instrument::new("NASDAQ", "NASDAQ Composite", Index, 16789.23, 289.23, 1.75, 1_500_000_000.0, timestamp),
        Instrument::new("GOLD", "Gold", Mineral, 2345.60, 65.60, 2.88, 10_000_000.0, timestamp),
        Instrument::new("SILVER", "Silver", Mineral, 28.45, 0.95, 3.45, 500_000.0, timestamp),
    ]
}
