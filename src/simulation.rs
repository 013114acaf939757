//! Orchestration: start feeds, run agents to completion, stop feeds

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use crate::agent::{RandomStrategy, TradingAgent};
use crate::common::channels::EventSender;
use crate::common::errors::{Result, SimError};
use crate::common::types::SimulationReport;
use crate::config::types::AppConfig;
use crate::market::{FeedHandle, MarketDataFeed, RandomWalk};
use crate::registry::Registry;

/// Offset separating agent RNG streams from feed RNG streams
const AGENT_STREAM_OFFSET: u64 = 1 << 32;

/// A configured market plus its agent population
pub struct Simulation {
    config: AppConfig,
    registry: Arc<Registry>,
    events: Option<EventSender>,
}

impl Simulation {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(Registry::from_config(&config)?);

        Ok(Self {
            config,
            registry,
            events: None,
        })
    }

    /// Publish ticks, fills and final reports on this channel
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Spawn one feed per instrument on the current runtime
    pub fn start_feeds(&self) -> Vec<FeedHandle> {
        let walk = RandomWalk::from_config(&self.config.market);
        let period = self.config.market.tick_interval();

        self.registry
            .instruments()
            .enumerate()
            .map(|(index, instrument)| {
                let feed = MarketDataFeed::new(
                    Arc::clone(instrument),
                    walk.clone(),
                    period,
                    task_rng(self.config.settings.seed, index as u64),
                );
                match &self.events {
                    Some(sender) => feed.with_events(sender.clone()).spawn(),
                    None => feed.spawn(),
                }
            })
            .collect()
    }

    /// Build one random-strategy agent per configured username
    pub fn agents(&self) -> Vec<TradingAgent> {
        let agents = &self.config.agents;

        agents
            .usernames
            .iter()
            .enumerate()
            .map(|(index, username)| {
                let rng = task_rng(
                    self.config.settings.seed,
                    AGENT_STREAM_OFFSET + index as u64,
                );
                let agent = TradingAgent::new(
                    username.clone(),
                    Arc::clone(&self.registry),
                    Box::new(RandomStrategy::new(rng, agents.max_quantity)),
                    agents.iterations,
                    agents.pacing(),
                );
                match &self.events {
                    Some(sender) => agent.with_events(sender.clone()),
                    None => agent,
                }
            })
            .collect()
    }

    /// Start every feed, run every agent to completion, then stop the feeds.
    #[instrument(skip_all)]
    pub async fn run(&self) -> Result<SimulationReport> {
        let feeds = self.start_feeds();
        info!(
            feeds = feeds.len(),
            agents = self.config.agents.usernames.len(),
            "Simulation started"
        );

        let mut tasks = JoinSet::new();
        for agent in self.agents() {
            tasks.spawn(agent.run());
        }

        let mut reports = Vec::with_capacity(tasks.len());
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("Agent task failed: {}", e);
                    failure.get_or_insert(SimError::Internal(format!("agent task failed: {}", e)));
                }
            }
        }

        let mut ticks = 0;
        for feed in feeds {
            let symbol = feed.symbol().to_string();
            match feed.shutdown().await {
                Ok(count) => ticks += count,
                Err(e) => warn!(symbol = %symbol, "Feed did not shut down cleanly: {}", e),
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        reports.sort_by(|a, b| a.username.cmp(&b.username));
        info!(agents = reports.len(), ticks, "Simulation finished");

        Ok(SimulationReport {
            agents: reports,
            ticks,
        })
    }
}

/// Independent generator per task: derived from the run seed when one is
/// configured, from entropy otherwise.
pub fn task_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ stream),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rust_decimal_macros::dec;

    fn fast_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.market.tick_interval_ms = 2;
        config.agents.pacing_ms = 1;
        config.settings.seed = Some(42);
        config
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = fast_config();
        config.agents.usernames.clear();
        assert!(matches!(
            Simulation::new(config),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn test_task_rng_is_reproducible() {
        let a: u64 = task_rng(Some(1), 3).gen();
        let b: u64 = task_rng(Some(1), 3).gen();
        let c: u64 = task_rng(Some(1), 4).gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_agents_match_usernames() {
        let simulation = Simulation::new(fast_config()).unwrap();
        let names: Vec<String> = simulation
            .agents()
            .iter()
            .map(|a| a.username().to_string())
            .collect();
        assert_eq!(names, vec!["trader1", "trader2", "trader3"]);
        assert_eq!(simulation.registry().starting_cash(), dec!(1000));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_reports_every_agent() {
        let simulation = Simulation::new(fast_config()).unwrap();

        let report = simulation.run().await.unwrap();

        let names: Vec<&str> = report.agents.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["trader1", "trader2", "trader3"]);
        for agent in &report.agents {
            assert!(agent.cash >= dec!(0));
            assert!(agent.positions.iter().all(|p| p.volume > 0));
        }
        assert_eq!(simulation.registry().ledger_count(), 3);

        // Feeds are stopped: their sequences no longer move.
        let before: Vec<u64> = simulation
            .registry()
            .instruments()
            .map(|i| i.snapshot().sequence)
            .collect();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let after: Vec<u64> = simulation
            .registry()
            .instruments()
            .map(|i| i.snapshot().sequence)
            .collect();
        assert_eq!(before, after);
        assert_eq!(report.ticks, after.iter().sum::<u64>());
    }
}
