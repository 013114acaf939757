//! Concurrency tests for ledgers and the registry
//!
//! These hammer a single ledger from many threads and tasks and check that no
//! committed update is lost.

mod common;

use common::{expected_cash, held, net_volume, sample_seeds};
use market_sim::{Ledger, Registry, Side, SimError, TradeFill};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

const THREADS: u64 = 8;
const OPS_PER_THREAD: usize = 2_000;

fn random_trades(ledger: &Ledger, seed: u64, ops: usize) -> Vec<TradeFill> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut fills = Vec::new();

    for _ in 0..ops {
        let symbol = if rng.gen_bool(0.5) { "YNDX" } else { "TATN" };
        let price = Decimal::new(rng.gen_range(1..=20_000), 2);
        let quantity = rng.gen_range(1..=10);
        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };

        let result = match side {
            Side::Buy => ledger.buy(symbol, price, quantity),
            Side::Sell => ledger.sell(symbol, price, quantity),
        };
        match result {
            Ok(()) => fills.push(TradeFill {
                username: format!("thread-{}", seed),
                symbol: symbol.to_string(),
                side,
                quantity,
                price,
            }),
            Err(SimError::InsufficientFunds { .. }) | Err(SimError::InsufficientPosition { .. }) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }

        assert!(ledger.cash() >= Decimal::ZERO);
    }

    fills
}

#[test]
fn test_no_lost_updates_across_threads() {
    let starting_cash = dec!(5000);
    let ledger = Arc::new(Ledger::new(starting_cash));

    let fills: Vec<TradeFill> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|seed| {
                let ledger = Arc::clone(&ledger);
                scope.spawn(move || random_trades(&ledger, seed, OPS_PER_THREAD))
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect()
    });

    assert!(!fills.is_empty());
    assert_eq!(ledger.cash(), expected_cash(starting_cash, &fills));
    assert_eq!(held(&ledger, "YNDX"), net_volume(&fills, "YNDX"));
    assert_eq!(held(&ledger, "TATN"), net_volume(&fills, "TATN"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_lost_updates_across_tasks() {
    let starting_cash = dec!(2000);
    let registry = Arc::new(Registry::new(&sample_seeds(), starting_cash).unwrap());

    let mut tasks = tokio::task::JoinSet::new();
    for seed in 0..THREADS {
        let registry = Arc::clone(&registry);
        tasks.spawn(async move {
            // Every task resolves the shared ledger itself, racing first touch.
            let ledger = registry.ledger("shared");
            let mut fills = Vec::new();
            for round in 0..20 {
                fills.extend(random_trades(&ledger, seed * 100 + round, 25));
                tokio::task::yield_now().await;
            }
            fills
        });
    }

    let mut fills = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        fills.extend(joined.expect("task panicked"));
    }

    assert_eq!(registry.ledger_count(), 1);
    let ledger = registry.ledger("shared");
    assert_eq!(ledger.cash(), expected_cash(starting_cash, &fills));
    assert_eq!(held(&ledger, "YNDX"), net_volume(&fills, "YNDX"));
    assert_eq!(held(&ledger, "TATN"), net_volume(&fills, "TATN"));
}

#[test]
fn test_ledgers_are_independent() {
    let registry = Registry::new(&sample_seeds(), dec!(1000)).unwrap();
    let alice = registry.ledger("alice");
    let bob = registry.ledger("bob");

    alice.buy("YNDX", dec!(100), 10).unwrap();
    assert_eq!(alice.cash(), Decimal::ZERO);
    assert_eq!(bob.cash(), dec!(1000));
    assert!(bob.sell("YNDX", dec!(100), 1).is_err());
}
