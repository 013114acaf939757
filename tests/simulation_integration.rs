//! End-to-end simulation runs with short timers

mod common;

use common::{expected_cash, fast_config, net_volume};
use market_sim::common::channels::create_event_channel_with_size;
use market_sim::{MarketEvent, Simulation, TradeFill};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::collections::HashMap;

#[test_log::test(tokio::test)]
async fn test_reports_match_published_fills() {
    let mut config = fast_config();
    config.agents.iterations = 20;
    let (tx, mut rx) = create_event_channel_with_size(100_000);
    let simulation = Simulation::new(config).unwrap().with_events(tx);

    let report = simulation.run().await.unwrap();
    drop(simulation);

    let mut fills: HashMap<String, Vec<TradeFill>> = HashMap::new();
    let mut finished = Vec::new();
    let mut ticks = 0u64;
    while let Some(event) = rx.recv().await {
        match event {
            MarketEvent::Tick { snapshot, .. } => {
                assert!(snapshot.price >= dec!(0.01));
                ticks += 1;
            }
            MarketEvent::Fill(fill) => fills.entry(fill.username.clone()).or_default().push(fill),
            MarketEvent::AgentFinished(report) => finished.push(report),
        }
    }

    assert_eq!(ticks, report.ticks);
    assert_eq!(report.agents.len(), 3);

    finished.sort_by(|a, b| a.username.cmp(&b.username));
    assert_eq!(finished, report.agents);

    for agent in &report.agents {
        let agent_fills = fills.get(&agent.username).cloned().unwrap_or_default();
        assert_eq!(agent.cash, expected_cash(dec!(1000), &agent_fills));
        for position in &agent.positions {
            assert_eq!(position.volume, net_volume(&agent_fills, &position.symbol));
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_custom_population() {
    let mut config = fast_config();
    config.agents.usernames = vec!["zed".to_string(), "amy".to_string()];
    config.agents.iterations = 3;
    config.agents.starting_cash = dec!(50);

    let simulation = Simulation::new(config).unwrap();
    let report = simulation.run().await.unwrap();

    let names: Vec<&str> = report.agents.iter().map(|r| r.username.as_str()).collect();
    assert_eq!(names, vec!["amy", "zed"]);
    assert!(report.agents.iter().all(|r| r.cash >= dec!(0)));
}

#[test]
fn test_simulation_builds_outside_runtime() {
    let simulation = Simulation::new(fast_config()).unwrap();
    assert_eq!(simulation.registry().symbols().len(), 4);
    assert_eq!(simulation.agents().len(), 3);

    let report = tokio_test::block_on(async {
        let runtime_simulation = Simulation::new({
            let mut config = fast_config();
            config.agents.iterations = 1;
            config
        })
        .unwrap();
        runtime_simulation.run().await
    });
    assert!(report.is_ok());
}
