//! Price feed publisher
//!
//! `PriceFeed` is the single writer of instrument state. Every tick builds a
//! complete new set and swaps it in under one write lock, so readers holding
//! a [`PriceBook`] only ever see whole, point-in-time sets.

use crate::core::{now_millis, Instrument, InstrumentSnapshot};
use crate::feed::random_walk::{step, RandomSource};
use crate::log_feed;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::Level;

/// Point-in-time instrument set
pub type InstrumentSet = Arc<Vec<Instrument>>;

/// Read-only handle to the authoritative instrument set
#[derive(Debug, Clone)]
pub struct PriceBook {
    current: Arc<RwLock<InstrumentSet>>,
}

impl PriceBook {
    /// Consistent copy of the whole set
    #[inline]
    pub fn snapshot(&self) -> InstrumentSet {
        self.current.read().clone()
    }

    /// Reduced records for the subscribe reply
    pub fn connected_snapshot(&self) -> Vec<InstrumentSnapshot> {
        self.snapshot().iter().map(InstrumentSnapshot::from).collect()
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }
}

/// Outcome of a single tick
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Full set after the tick
    pub instruments: InstrumentSet,
    /// Instruments that advanced
    pub updated: usize,
    /// Instruments left at their previous state
    pub skipped: usize,
}

/// Single-writer owner of instrument prices
pub struct PriceFeed<R> {
    current: Arc<RwLock<InstrumentSet>>,
    source: R,
    price_floor: f64,
}

impl<R: RandomSource> PriceFeed<R> {
    /// Create a feed over a fixed instrument set
    pub fn new(instruments: Vec<Instrument>, source: R, price_floor: f64) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(instruments))),
            source,
            price_floor,
        }
    }

    /// Read handle for the gateway and status API
    pub fn book(&self) -> PriceBook {
        PriceBook {
            current: self.current.clone(),
        }
    }

    /// Advance every instrument one step using the wall clock
    pub fn tick(&mut self) -> TickReport {
        self.tick_at(now_millis())
    }

    /// Advance every instrument one step at `now_ms`
    ///
    /// A failing instrument keeps its previous state; the rest still advance.
    pub fn tick_at(&mut self, now_ms: u64) -> TickReport {
        let previous = self.current.read().clone();
        let mut next = Vec::with_capacity(previous.len());
        let mut skipped = 0;

        for instrument in previous.iter() {
            let unit = self.source.next_unit();
            match step(instrument, unit, now_ms, self.price_floor) {
                Ok(updated) => next.push(updated),
                Err(e) => {
                    log_feed!(Level::WARN, "Skipping {} this tick: {}", instrument.symbol, e);
                    skipped += 1;
                    next.push(instrument.clone());
                }
            }
        }

        let next = Arc::new(next);
        *self.current.write() = next.clone();

        log_feed!(
            Level::DEBUG,
            "Tick applied: {} updated, {} skipped",
            next.len() - skipped,
            skipped
        );

        TickReport {
            updated: next.len() - skipped,
            skipped,
            instruments: next,
        }
    }
}
