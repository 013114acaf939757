//! A single tradable instrument and its lock discipline

use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::common::types::InstrumentSnapshot;
use crate::config::types::InstrumentSeed;

/// Current price and volume of one symbol
///
/// Price, volume and the update sequence live behind one lock and are only
/// reachable through [`Instrument::snapshot`] and [`Instrument::update`], so a
/// reader never sees the price of one update paired with the volume of another.
#[derive(Debug)]
pub struct Instrument {
    symbol: String,
    state: RwLock<InstrumentSnapshot>,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, price: Decimal, volume: u64, depth: u64) -> Self {
        Self {
            symbol: symbol.into(),
            state: RwLock::new(InstrumentSnapshot {
                price,
                volume,
                depth,
                sequence: 0,
            }),
        }
    }

    pub fn from_seed(seed: &InstrumentSeed) -> Self {
        Self::new(seed.symbol.clone(), seed.price, seed.volume, seed.depth)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Read price, volume and sequence as one committed unit
    pub fn snapshot(&self) -> InstrumentSnapshot {
        *self.state.read()
    }

    /// Last committed price
    pub fn price(&self) -> Decimal {
        self.state.read().price
    }

    /// Recompute price and volume from their current values and commit both
    /// under a single write scope. Returns the committed state.
    ///
    /// The closures run while the write lock is held; they must not touch this
    /// instrument again.
    pub fn update<P, V>(&self, price_fn: P, volume_fn: V) -> InstrumentSnapshot
    where
        P: FnOnce(Decimal) -> Decimal,
        V: FnOnce(u64) -> u64,
    {
        let mut state = self.state.write();
        state.price = price_fn(state.price);
        state.volume = volume_fn(state.volume);
        state.sequence += 1;
        *state
    }
}
