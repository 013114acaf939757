//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::common::errors::{Result, SimError};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Instruments and their price feeds
    #[serde(default)]
    pub market: MarketConfig,
    /// Trading agents
    #[serde(default)]
    pub agents: AgentConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Reject configurations the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        self.market.validate()?;
        self.agents.validate()
    }
}

/// Seed values for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSeed {
    pub symbol: String,
    #[serde(default = "default_seed_price")]
    pub price: Decimal,
    #[serde(default = "default_seed_volume")]
    pub volume: u64,
    #[serde(default = "default_seed_depth")]
    pub depth: u64,
}

impl InstrumentSeed {
    pub fn new(symbol: impl Into<String>, price: Decimal, volume: u64, depth: u64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            volume,
            depth,
        }
    }
}

fn default_seed_price() -> Decimal {
    dec!(100)
}

fn default_seed_volume() -> u64 {
    1000
}

fn default_seed_depth() -> u64 {
    10
}

/// Market data feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Instruments created at startup
    #[serde(default = "default_instruments")]
    pub instruments: Vec<InstrumentSeed>,
    /// Delay between feed updates in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Maximum relative price move per tick (0.02 = ±2%)
    #[serde(default = "default_price_band")]
    pub price_band: Decimal,
    /// Lowest price a feed may produce
    #[serde(default = "default_price_floor")]
    pub price_floor: Decimal,
    /// Volume may rise by at most volume / divisor per tick
    #[serde(default = "default_volume_drift_divisor")]
    pub volume_drift_divisor: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            instruments: default_instruments(),
            tick_interval_ms: default_tick_interval(),
            price_band: default_price_band(),
            price_floor: default_price_floor(),
            volume_drift_divisor: default_volume_drift_divisor(),
        }
    }
}

impl MarketConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(SimError::Configuration(
                "at least one instrument is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for seed in &self.instruments {
            if seed.symbol.trim().is_empty() {
                return Err(SimError::Configuration("empty instrument symbol".into()));
            }
            if !seen.insert(seed.symbol.as_str()) {
                return Err(SimError::DuplicateInstrument(seed.symbol.clone()));
            }
            if seed.price <= Decimal::ZERO {
                return Err(SimError::Configuration(format!(
                    "seed price for {} must be positive, got {}",
                    seed.symbol, seed.price
                )));
            }
        }

        if self.tick_interval_ms == 0 {
            return Err(SimError::Configuration(
                "tick_interval_ms must be positive".into(),
            ));
        }
        if self.price_band <= Decimal::ZERO || self.price_band >= Decimal::ONE {
            return Err(SimError::Configuration(format!(
                "price_band must lie in (0, 1), got {}",
                self.price_band
            )));
        }
        if self.price_floor <= Decimal::ZERO {
            return Err(SimError::Configuration(format!(
                "price_floor must be positive, got {}",
                self.price_floor
            )));
        }
        if self.volume_drift_divisor == 0 {
            return Err(SimError::Configuration(
                "volume_drift_divisor must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_instruments() -> Vec<InstrumentSeed> {
    ["YNDX", "TATN", "MGNT", "TCSG"]
        .into_iter()
        .map(|symbol| {
            InstrumentSeed::new(
                symbol,
                default_seed_price(),
                default_seed_volume(),
                default_seed_depth(),
            )
        })
        .collect()
}

fn default_tick_interval() -> u64 {
    1000
}

fn default_price_band() -> Decimal {
    dec!(0.02)
}

fn default_price_floor() -> Decimal {
    dec!(0.01)
}

fn default_volume_drift_divisor() -> u64 {
    10
}

/// Trading agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// One agent task per username
    #[serde(default = "default_usernames")]
    pub usernames: Vec<String>,
    /// Cash given to a ledger when it is first created
    #[serde(default = "default_starting_cash")]
    pub starting_cash: Decimal,
    /// Trading iterations per agent before it reports
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Delay between trading iterations in milliseconds
    #[serde(default = "default_pacing")]
    pub pacing_ms: u64,
    /// Largest quantity a random agent will trade at once
    #[serde(default = "default_max_quantity")]
    pub max_quantity: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            usernames: default_usernames(),
            starting_cash: default_starting_cash(),
            iterations: default_iterations(),
            pacing_ms: default_pacing(),
            max_quantity: default_max_quantity(),
        }
    }
}

impl AgentConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.usernames.is_empty() {
            return Err(SimError::Configuration(
                "at least one agent username is required".into(),
            ));
        }
        if self.usernames.iter().any(|u| u.trim().is_empty()) {
            return Err(SimError::Configuration("empty agent username".into()));
        }
        if self.starting_cash < Decimal::ZERO {
            return Err(SimError::Configuration(format!(
                "starting_cash must not be negative, got {}",
                self.starting_cash
            )));
        }
        if self.max_quantity == 0 {
            return Err(SimError::Configuration(
                "max_quantity must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_usernames() -> Vec<String> {
    vec![
        "trader1".to_string(),
        "trader2".to_string(),
        "trader3".to_string(),
    ]
}

fn default_starting_cash() -> Decimal {
    dec!(1000)
}

fn default_iterations() -> u32 {
    5
}

fn default_pacing() -> u64 {
    1000
}

fn default_max_quantity() -> u64 {
    10
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Seed for reproducible runs; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Capacity of the market event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            seed: None,
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_buffer() -> usize {
    1000
}
