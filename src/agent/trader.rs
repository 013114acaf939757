//! Trading agent task

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::strategy::{BoxedStrategy, OrderIntent};
use crate::common::channels::{publish, EventSender};
use crate::common::errors::Result;
use crate::common::types::{LedgerReport, MarketEvent, Side, TradeFill};
use crate::ledger::Ledger;
use crate::registry::Registry;

/// Lifecycle of a trading agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Ledger not yet resolved
    Init,
    /// Executing trading iteration `iteration` (zero-based)
    Trading { iteration: u32 },
    /// Iterations exhausted, final report pending
    Reporting,
    /// Report produced; terminal
    Done,
}

/// One agent trading against its own ledger for a fixed number of iterations
pub struct TradingAgent {
    username: String,
    registry: Arc<Registry>,
    strategy: BoxedStrategy,
    iterations: u32,
    pacing: Duration,
    events: Option<EventSender>,
    state: AgentState,
    ledger: Option<Arc<Ledger>>,
    fills: Vec<TradeFill>,
    rejections: u32,
    report: Option<LedgerReport>,
}

impl TradingAgent {
    pub fn new(
        username: impl Into<String>,
        registry: Arc<Registry>,
        strategy: BoxedStrategy,
        iterations: u32,
        pacing: Duration,
    ) -> Self {
        Self {
            username: username.into(),
            registry,
            strategy,
            iterations,
            pacing,
            events: None,
            state: AgentState::Init,
            ledger: None,
            fills: Vec::new(),
            rejections: 0,
            report: None,
        }
    }

    /// Publish fills and the final report on this channel
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Successful trades so far, in execution order
    pub fn fills(&self) -> &[TradeFill] {
        &self.fills
    }

    /// Intents skipped because the ledger or registry refused them
    pub fn rejections(&self) -> u32 {
        self.rejections
    }

    pub fn report(&self) -> Option<&LedgerReport> {
        self.report.as_ref()
    }

    /// Advance the state machine by one transition and return the new state
    pub fn step(&mut self) -> AgentState {
        let next = match self.state {
            AgentState::Init => {
                self.ledger = Some(self.registry.ledger(&self.username));
                self.first_trading_state()
            }
            AgentState::Trading { iteration } => {
                self.trade_iteration(iteration);
                let next = iteration + 1;
                if next < self.iterations {
                    AgentState::Trading { iteration: next }
                } else {
                    AgentState::Reporting
                }
            }
            AgentState::Reporting => {
                let report = self.current_ledger().report(&self.username);
                info!(
                    agent = %self.username,
                    cash = %report.cash,
                    positions = report.positions.len(),
                    fills = self.fills.len(),
                    rejections = self.rejections,
                    "Agent finished"
                );
                publish(
                    self.events.as_ref(),
                    MarketEvent::AgentFinished(report.clone()),
                );
                self.report = Some(report);
                AgentState::Done
            }
            AgentState::Done => AgentState::Done,
        };

        self.state = next;
        next
    }

    /// Run every iteration with the pacing delay between them and return the
    /// final ledger report
    #[instrument(skip_all, fields(agent = %self.username, strategy = %self.strategy.name()))]
    pub async fn run(mut self) -> LedgerReport {
        loop {
            let previous = self.state;
            let state = self.step();

            match (previous, state) {
                (_, AgentState::Done) => break,
                (AgentState::Trading { .. }, AgentState::Trading { .. }) => {
                    sleep(self.pacing).await;
                }
                _ => {}
            }
        }

        match self.report.take() {
            Some(report) => report,
            None => self.current_ledger().report(&self.username),
        }
    }

    fn first_trading_state(&self) -> AgentState {
        if self.iterations == 0 {
            AgentState::Reporting
        } else {
            AgentState::Trading { iteration: 0 }
        }
    }

    fn current_ledger(&mut self) -> Arc<Ledger> {
        let registry = &self.registry;
        let username = &self.username;
        Arc::clone(
            self.ledger
                .get_or_insert_with(|| registry.ledger(username)),
        )
    }

    fn trade_iteration(&mut self, iteration: u32) {
        let Some(intent) = self.strategy.next_order(self.registry.symbols()) else {
            debug!(agent = %self.username, iteration, "Strategy passed");
            return;
        };

        match self.execute(&intent) {
            Ok(fill) => {
                info!("{}", fill);
                self.strategy.on_fill(&fill);
                publish(self.events.as_ref(), MarketEvent::Fill(fill.clone()));
                self.fills.push(fill);
            }
            Err(e) if !e.is_rejection() => {
                warn!(agent = %self.username, iteration, "Trade failed: {}", e);
                self.strategy.on_rejected(&intent, &e);
                self.rejections += 1;
            }
            Err(e) => {
                debug!(
                    agent = %self.username,
                    iteration,
                    symbol = %intent.symbol,
                    side = %intent.side,
                    quantity = intent.quantity,
                    "Skipped: {}", e
                );
                self.strategy.on_rejected(&intent, &e);
                self.rejections += 1;
            }
        }
    }

    /// Snapshot the instrument price, then trade at it. The price is not
    /// re-checked when the ledger commits, so the fill may be at a price the
    /// feed has already moved away from.
    fn execute(&mut self, intent: &OrderIntent) -> Result<TradeFill> {
        let price = self.registry.require_instrument(&intent.symbol)?.price();
        let ledger = self.current_ledger();

        match intent.side {
            Side::Buy => ledger.buy(&intent.symbol, price, intent.quantity)?,
            Side::Sell => ledger.sell(&intent.symbol, price, intent.quantity)?,
        }

        Ok(TradeFill {
            username: self.username.clone(),
            symbol: intent.symbol.clone(),
            side: intent.side,
            quantity: intent.quantity,
            price,
        })
    }
}
