//! Trading agents and the strategies that drive them
//!
//! Each agent owns one ledger (resolved through the registry on its first
//! step) and walks a fixed state machine:
//!
//! ```text
//! Init ──► Trading(0) ──► … ──► Trading(N-1) ──► Reporting ──► Done
//! ```
//!
//! Every trading iteration asks the [`Strategy`] for an [`OrderIntent`],
//! snapshots the instrument price, and applies the trade to the ledger.
//! Rejected intents are skipped without retry.

mod strategy;
mod trader;

pub use strategy::{BoxedStrategy, OrderIntent, RandomStrategy, ScriptedStrategy, Strategy};
pub use trader::{AgentState, TradingAgent};
