//! MarketSim - Main Entry Point
//!
//! Runs the configured instruments and trading agents, printing one line per
//! price tick and per fill, then every agent's final portfolio.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use market_sim::common::channels::{create_event_channel_with_size, EventReceiver};
use market_sim::config::load_config;
use market_sim::{MarketEvent, Simulation};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "MARKET_SIM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Trading iterations per agent
    #[arg(long)]
    iterations: Option<u32>,

    /// Comma-separated list of agent usernames
    #[arg(long, value_delimiter = ',')]
    agents: Option<Vec<String>>,

    /// Print the final report as JSON on stdout; tick and fill lines go to stderr
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let mut config = load_config(Some(args.config.as_str()))?;
    if let Some(seed) = args.seed {
        config.settings.seed = Some(seed);
    }
    if let Some(iterations) = args.iterations {
        config.agents.iterations = iterations;
    }
    if let Some(agents) = args.agents.clone() {
        config.agents.usernames = agents;
    }

    // Initialize logging; RUST_LOG wins over the configured level
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.settings.log_level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting MarketSim");
    info!("Configuration file: {}", args.config);

    let (sender, receiver) = create_event_channel_with_size(config.settings.event_buffer);
    let simulation = Simulation::new(config)?.with_events(sender);
    let printer = tokio::spawn(print_events(receiver, args.json));

    let report = tokio::select! {
        result = simulation.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, cleaning up...");
            return Ok(());
        }
    };

    // Dropping the simulation closes the last sender, which ends the printer.
    drop(simulation);
    printer.await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    info!("Simulation complete: {} ticks", report.ticks);
    Ok(())
}

/// Where a market event line is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventOutput {
    Stdout,
    Stderr,
    Skip,
}

/// In JSON mode stdout carries only the final report: ticks and fills move to
/// stderr and per-agent reports are left to the JSON document.
fn event_output(event: &MarketEvent, json: bool) -> EventOutput {
    match (event, json) {
        (_, false) => EventOutput::Stdout,
        (MarketEvent::AgentFinished(_), true) => EventOutput::Skip,
        (_, true) => EventOutput::Stderr,
    }
}

/// Print ticks and fills as they arrive, then each agent's final portfolio
async fn print_events(mut receiver: EventReceiver, json: bool) {
    while let Some(event) = receiver.recv().await {
        match event_output(&event, json) {
            EventOutput::Stdout => println!("{}", event),
            EventOutput::Stderr => eprintln!("{}", event),
            EventOutput::Skip => {}
        }
    }
}
