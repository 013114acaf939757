//! Shared types passed between feeds, agents and the reporter

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Past-tense verb used in fill lines
    pub fn verb(&self) -> &'static str {
        match self {
            Side::Buy => "bought",
            Side::Sell => "sold",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Consistent point-in-time read of one instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    pub price: Decimal,
    pub volume: u64,
    /// Order-book depth (carried, not used by any pricing logic)
    pub depth: u64,
    /// Number of updates committed so far
    pub sequence: u64,
}

/// A held position as reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub last_price: Decimal,
    pub volume: u64,
}

/// Final state of one agent's ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReport {
    pub username: String,
    pub cash: Decimal,
    /// Held positions sorted by symbol
    pub positions: Vec<PositionSnapshot>,
}

impl LedgerReport {
    pub fn position(&self, symbol: &str) -> Option<&PositionSnapshot> {
        self.positions.iter().find(|p| p.symbol == symbol)
    }
}

impl std::fmt::Display for LedgerReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}'s Portfolio:", self.username)?;
        writeln!(f, "Cash: {:.2}", self.cash.round_dp(2))?;
        write!(f, "Positions:")?;
        for position in &self.positions {
            write!(
                f,
                "\n{}: Price: {:.2}, Volume: {}",
                position.symbol,
                position.last_price.round_dp(2),
                position.volume
            )?;
        }
        Ok(())
    }
}

/// A successful buy or sell against a ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFill {
    pub username: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub price: Decimal,
}

impl TradeFill {
    /// Signed cash movement of this fill (negative for buys)
    pub fn cash_delta(&self) -> Decimal {
        let value = self.price * Decimal::from(self.quantity);
        match self.side {
            Side::Buy => -value,
            Side::Sell => value,
        }
    }
}

impl std::fmt::Display for TradeFill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} shares of {} at {:.2}",
            self.username,
            self.side.verb(),
            self.quantity,
            self.symbol,
            self.price.round_dp(2)
        )
    }
}

/// Events published by feeds and agents for the reporter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    /// An instrument committed a price/volume update
    Tick {
        symbol: String,
        snapshot: InstrumentSnapshot,
        timestamp: DateTime<Utc>,
    },
    /// An agent's buy or sell succeeded
    Fill(TradeFill),
    /// An agent reached its terminal state
    AgentFinished(LedgerReport),
}

impl std::fmt::Display for MarketEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketEvent::Tick {
                symbol, snapshot, ..
            } => write!(
                f,
                "Instrument {} - Price: {:.2}, Volume: {}",
                symbol,
                snapshot.price.round_dp(2),
                snapshot.volume
            ),
            MarketEvent::Fill(fill) => write!(f, "{}", fill),
            MarketEvent::AgentFinished(report) => write!(f, "{}", report),
        }
    }
}

/// Outcome of a full simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// One report per agent, sorted by username
    pub agents: Vec<LedgerReport>,
    /// Total feed updates committed before shutdown
    pub ticks: u64,
}
