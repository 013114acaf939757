//! Per-agent cash and positions

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::common::errors::{Result, SimError};
use crate::common::types::{LedgerReport, PositionSnapshot};

/// Held volume and last traded price of one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub last_price: Decimal,
    pub volume: u64,
}

#[derive(Debug)]
struct LedgerState {
    cash: Decimal,
    positions: HashMap<String, Position>,
}

/// One agent's cash balance and positions
///
/// Every read-modify-write happens inside one lock scope, so concurrent
/// `buy`/`sell` calls on the same ledger are linearized. Positions refer to
/// instruments by symbol only.
#[derive(Debug)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Ledger {
    pub fn new(starting_cash: Decimal) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                cash: starting_cash,
                positions: HashMap::new(),
            }),
        }
    }

    /// Buy `quantity` of `symbol` at `price`, debiting cash.
    ///
    /// Fails with `InsufficientFunds` when cash does not cover the cost. The
    /// ledger is left untouched on any failure.
    pub fn buy(&self, symbol: &str, price: Decimal, quantity: u64) -> Result<()> {
        let cost = order_value(price, quantity)?;

        let mut state = self.state.lock();
        if state.cash < cost {
            return Err(SimError::InsufficientFunds {
                required: cost,
                available: state.cash,
            });
        }

        let cash = state
            .cash
            .checked_sub(cost)
            .ok_or(SimError::CashOverflow {
                cash: state.cash,
                amount: cost,
            })?;
        let held = state.positions.get(symbol).map_or(0, |p| p.volume);
        let volume = held
            .checked_add(quantity)
            .ok_or(SimError::InvalidQuantity(quantity))?;

        state.positions.insert(
            symbol.to_string(),
            Position {
                last_price: price,
                volume,
            },
        );
        state.cash = cash;
        Ok(())
    }

    /// Sell `quantity` of `symbol` at `price`, crediting cash. A position
    /// that reaches zero volume is removed.
    ///
    /// Fails with `InsufficientPosition` when the symbol is not held or the
    /// held volume is smaller than `quantity`, and with `CashOverflow` when the
    /// proceeds cannot be credited. Nothing changes on failure.
    pub fn sell(&self, symbol: &str, price: Decimal, quantity: u64) -> Result<()> {
        let proceeds = order_value(price, quantity)?;

        let mut state = self.state.lock();
        let held = state.positions.get(symbol).map_or(0, |p| p.volume);
        if held < quantity {
            return Err(SimError::InsufficientPosition {
                symbol: symbol.to_string(),
                requested: quantity,
                held,
            });
        }

        let cash = state
            .cash
            .checked_add(proceeds)
            .ok_or(SimError::CashOverflow {
                cash: state.cash,
                amount: proceeds,
            })?;

        let remaining = held - quantity;
        if remaining == 0 {
            state.positions.remove(symbol);
        } else if let Some(position) = state.positions.get_mut(symbol) {
            position.volume = remaining;
            position.last_price = price;
        }
        state.cash = cash;
        Ok(())
    }

    pub fn cash(&self) -> Decimal {
        self.state.lock().cash
    }

    pub fn position(&self, symbol: &str) -> Option<Position> {
        self.state.lock().positions.get(symbol).copied()
    }

    /// Consistent copy of cash and all positions, sorted by symbol
    pub fn report(&self, username: &str) -> LedgerReport {
        let state = self.state.lock();
        let mut positions: Vec<PositionSnapshot> = state
            .positions
            .iter()
            .map(|(symbol, position)| PositionSnapshot {
                symbol: symbol.clone(),
                last_price: position.last_price,
                volume: position.volume,
            })
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        LedgerReport {
            username: username.to_string(),
            cash: state.cash,
            positions,
        }
    }
}

fn order_value(price: Decimal, quantity: u64) -> Result<Decimal> {
    if quantity == 0 {
        return Err(SimError::InvalidQuantity(quantity));
    }
    if price < Decimal::ZERO {
        return Err(SimError::InvalidPrice(price));
    }
    price
        .checked_mul(Decimal::from(quantity))
        .ok_or(SimError::InvalidQuantity(quantity))
}
