//! Holdings ledgers: one cash balance and position book per agent

mod holdings;

pub use holdings::{Ledger, Position};
