//! Order-picking strategies that drive trading agents

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

use crate::common::errors::SimError;
use crate::common::types::{Side, TradeFill};

/// What an agent wants to trade this iteration
///
/// The price is not part of the intent: the agent fills it in from an
/// instrument snapshot just before trading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
}

impl OrderIntent {
    pub fn new(symbol: impl Into<String>, side: Side, quantity: u64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
        }
    }
}

/// Decision logic driven by a trading agent
///
/// # Implementation Notes
///
/// - `next_order` is called once per trading iteration and must not block
/// - Returning `None` passes on the iteration
/// - Fill and rejection callbacks are informational; the ledger has already
///   been updated (or left untouched) when they run
pub trait Strategy: Send {
    /// Unique identifier for this strategy
    fn name(&self) -> &str;

    /// Choose the next order from the registry's symbols
    fn next_order(&mut self, symbols: &[String]) -> Option<OrderIntent>;

    /// Called after a successful buy or sell
    fn on_fill(&mut self, _fill: &TradeFill) {}

    /// Called when the ledger or registry rejects an intent
    fn on_rejected(&mut self, _intent: &OrderIntent, _reason: &SimError) {}
}

/// Boxed strategy for dynamic dispatch
pub type BoxedStrategy = Box<dyn Strategy>;

/// Uniformly random symbol, side and quantity in `[1, max_quantity]`
pub struct RandomStrategy {
    rng: StdRng,
    max_quantity: u64,
}

impl RandomStrategy {
    pub fn new(rng: StdRng, max_quantity: u64) -> Self {
        Self {
            rng,
            max_quantity: max_quantity.max(1),
        }
    }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &str {
        "random"
    }

    fn next_order(&mut self, symbols: &[String]) -> Option<OrderIntent> {
        let symbol = symbols.choose(&mut self.rng)?.clone();
        let quantity = self.rng.gen_range(1..=self.max_quantity);
        let side = if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        };

        Some(OrderIntent {
            symbol,
            side,
            quantity,
        })
    }
}

/// Replays a fixed list of intents, then passes
pub struct ScriptedStrategy {
    orders: VecDeque<Option<OrderIntent>>,
}

impl ScriptedStrategy {
    pub fn new(orders: impl IntoIterator<Item = Option<OrderIntent>>) -> Self {
        Self {
            orders: orders.into_iter().collect(),
        }
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn next_order(&mut self, _symbols: &[String]) -> Option<OrderIntent> {
        self.orders.pop_front().flatten()
    }
}
