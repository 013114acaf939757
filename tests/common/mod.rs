//! Common test utilities and fixtures

#![allow(dead_code)]

use market_sim::config::types::{AppConfig, InstrumentSeed};
use market_sim::{Ledger, TradeFill};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Reference configuration with millisecond timers and a fixed seed
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.market.tick_interval_ms = 2;
    config.agents.pacing_ms = 1;
    config.settings.seed = Some(20240101);
    config
}

/// Two-instrument seed set used by ledger and registry tests
pub fn sample_seeds() -> Vec<InstrumentSeed> {
    vec![
        InstrumentSeed::new("YNDX", dec!(100), 1000, 10),
        InstrumentSeed::new("TATN", dec!(50), 1000, 10),
    ]
}

/// Starting cash plus the signed cash movement of every fill
pub fn expected_cash(starting_cash: Decimal, fills: &[TradeFill]) -> Decimal {
    fills
        .iter()
        .fold(starting_cash, |cash, fill| cash + fill.cash_delta())
}

/// Net volume bought minus sold for one symbol
pub fn net_volume(fills: &[TradeFill], symbol: &str) -> u64 {
    let (bought, sold) = fills
        .iter()
        .filter(|f| f.symbol == symbol)
        .fold((0u64, 0u64), |(bought, sold), fill| match fill.side {
            market_sim::Side::Buy => (bought + fill.quantity, sold),
            market_sim::Side::Sell => (bought, sold + fill.quantity),
        });
    bought - sold
}

/// Held volume for `symbol`, zero when absent
pub fn held(ledger: &Ledger, symbol: &str) -> u64 {
    ledger.position(symbol).map_or(0, |p| p.volume)
}
