//! Shared registry of instruments and ledgers

use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::common::errors::{Result, SimError};
use crate::config::types::{AppConfig, InstrumentSeed};
use crate::ledger::Ledger;
use crate::market::Instrument;

/// Owned registry handed to every feed and agent task as `Arc<Registry>`
///
/// The instrument map is fixed at construction and read without a map-level
/// lock; each instrument guards its own fields. The ledger map is a `DashMap`
/// so that first-touch creation is atomic while ledgers on different shards
/// never contend.
#[derive(Debug)]
pub struct Registry {
    instruments: HashMap<String, Arc<Instrument>>,
    /// Symbols in seed order
    symbols: Vec<String>,
    ledgers: DashMap<String, Arc<Ledger>>,
    starting_cash: Decimal,
}

impl Registry {
    pub fn new(seeds: &[InstrumentSeed], starting_cash: Decimal) -> Result<Self> {
        if seeds.is_empty() {
            return Err(SimError::Configuration(
                "registry needs at least one instrument".into(),
            ));
        }

        let mut instruments = HashMap::with_capacity(seeds.len());
        let mut symbols = Vec::with_capacity(seeds.len());
        for seed in seeds {
            if instruments.contains_key(&seed.symbol) {
                return Err(SimError::DuplicateInstrument(seed.symbol.clone()));
            }
            instruments.insert(seed.symbol.clone(), Arc::new(Instrument::from_seed(seed)));
            symbols.push(seed.symbol.clone());
        }

        Ok(Self {
            instruments,
            symbols,
            ledgers: DashMap::new(),
            starting_cash,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.market.instruments, config.agents.starting_cash)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn instrument(&self, symbol: &str) -> Option<&Arc<Instrument>> {
        self.instruments.get(symbol)
    }

    pub fn require_instrument(&self, symbol: &str) -> Result<&Arc<Instrument>> {
        self.instrument(symbol)
            .ok_or_else(|| SimError::UnknownInstrument(symbol.to_string()))
    }

    /// Instruments in seed order
    pub fn instruments(&self) -> impl Iterator<Item = &Arc<Instrument>> + '_ {
        self.symbols
            .iter()
            .filter_map(move |symbol| self.instruments.get(symbol))
    }

    pub fn starting_cash(&self) -> Decimal {
        self.starting_cash
    }

    /// Look up the ledger for `username`, creating it with the starting cash
    /// on first touch. Concurrent first touches all receive the same ledger.
    pub fn ledger(&self, username: &str) -> Arc<Ledger> {
        if let Some(existing) = self.ledgers.get(username) {
            return Arc::clone(existing.value());
        }

        let entry = self
            .ledgers
            .entry(username.to_string())
            .or_insert_with(|| {
                debug!(username, cash = %self.starting_cash, "Creating ledger");
                Arc::new(Ledger::new(self.starting_cash))
            });
        Arc::clone(entry.value())
    }

    /// Ledger for `username` if it has been created
    pub fn existing_ledger(&self, username: &str) -> Option<Arc<Ledger>> {
        self.ledgers.get(username).map(|l| Arc::clone(l.value()))
    }

    pub fn ledger_count(&self) -> usize {
        self.ledgers.len()
    }
}
