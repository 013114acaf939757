//! MarketSim Library
//!
//! A concurrent market simulator: instruments whose price and volume move on
//! independent background feeds, and trading agents that read those prices
//! and buy or sell against their own holdings ledgers.

pub mod agent;
pub mod common;
pub mod config;
pub mod ledger;
pub mod market;
pub mod registry;
pub mod simulation;

// Re-export commonly used types
pub use agent::{AgentState, BoxedStrategy, OrderIntent, RandomStrategy, Strategy, TradingAgent};
pub use common::errors::{Result, SimError};
pub use common::types::{
    InstrumentSnapshot, LedgerReport, MarketEvent, PositionSnapshot, Side, SimulationReport,
    TradeFill,
};
pub use config::types::AppConfig;
pub use ledger::{Ledger, Position};
pub use market::{FeedHandle, Instrument, MarketDataFeed, RandomWalk};
pub use registry::Registry;
pub use simulation::Simulation;
