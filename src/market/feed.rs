//! Background market data feed for one instrument

use rand::rngs::StdRng;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

use super::instrument::Instrument;
use crate::common::channels::{publish, EventSender};
use crate::common::errors::{Result, SimError};
use crate::common::types::{InstrumentSnapshot, MarketEvent};
use crate::config::types::MarketConfig;

/// Resolution of a sampled price move: the band is split into this many steps
/// on each side of zero.
const PRICE_STEPS: i64 = 1_000_000;

/// Decimal places kept on every generated price
const PRICE_SCALE: u32 = 8;

/// Random walk applied to an instrument on every tick
///
/// - price: `current + current * U(-band, band)`, floored at `price_floor`
/// - volume: `current + U_int[0, current / divisor] - current`, so the next
///   volume lands in `[0, current / divisor]`
#[derive(Debug, Clone, PartialEq)]
pub struct RandomWalk {
    price_band: Decimal,
    price_floor: Decimal,
    volume_drift_divisor: u64,
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self::from_config(&MarketConfig::default())
    }
}

impl RandomWalk {
    pub fn new(price_band: Decimal, price_floor: Decimal, volume_drift_divisor: u64) -> Self {
        Self {
            price_band,
            price_floor,
            volume_drift_divisor: volume_drift_divisor.max(1),
        }
    }

    pub fn from_config(config: &MarketConfig) -> Self {
        Self::new(
            config.price_band,
            config.price_floor,
            config.volume_drift_divisor,
        )
    }

    /// Draw a relative price move, uniform over `[-band, band]`
    pub fn sample_price_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Decimal {
        let step = rng.gen_range(-PRICE_STEPS..=PRICE_STEPS);
        self.price_band * Decimal::new(step, 6)
    }

    /// Apply a relative move drawn by [`RandomWalk::sample_price_move`]
    pub fn apply_price_move(&self, current: Decimal, relative_move: Decimal) -> Decimal {
        let next = current + current * relative_move;
        next.round_dp(PRICE_SCALE).max(self.price_floor)
    }

    pub fn next_price<R: Rng + ?Sized>(&self, rng: &mut R, current: Decimal) -> Decimal {
        let relative_move = self.sample_price_move(rng);
        self.apply_price_move(current, relative_move)
    }

    pub fn next_volume<R: Rng + ?Sized>(&self, rng: &mut R, current: u64) -> u64 {
        let current = i128::from(current);
        let change = rng.gen_range(0..=current / i128::from(self.volume_drift_divisor)) - current;
        u64::try_from((current + change).max(0)).unwrap_or(u64::MAX)
    }
}

/// Periodically perturbs one instrument until stopped
pub struct MarketDataFeed {
    instrument: Arc<Instrument>,
    walk: RandomWalk,
    period: Duration,
    rng: StdRng,
    events: Option<EventSender>,
}

impl MarketDataFeed {
    pub fn new(instrument: Arc<Instrument>, walk: RandomWalk, period: Duration, rng: StdRng) -> Self {
        Self {
            instrument,
            walk,
            period: period.max(Duration::from_millis(1)),
            rng,
            events: None,
        }
    }

    /// Publish a `MarketEvent::Tick` for every committed update
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Apply one random-walk step to the instrument
    pub fn tick(&mut self) -> InstrumentSnapshot {
        // The price move is drawn up front so that only the volume closure
        // needs the generator while the instrument lock is held.
        let relative_move = self.walk.sample_price_move(&mut self.rng);
        let walk = &self.walk;
        let rng = &mut self.rng;
        self.instrument.update(
            |price| walk.apply_price_move(price, relative_move),
            |volume| walk.next_volume(rng, volume),
        )
    }

    /// Start the feed on the current tokio runtime
    pub fn spawn(self) -> FeedHandle {
        let symbol = self.instrument.symbol().to_string();
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));

        FeedHandle {
            symbol,
            stop: stop_tx,
            task,
        }
    }

    /// Tick once per period until the stop signal fires or its sender is
    /// dropped. Returns the number of updates committed.
    #[instrument(skip_all, fields(symbol = %self.instrument.symbol()))]
    async fn run(mut self, mut stop: watch::Receiver<bool>) -> u64 {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0u64;

        debug!("Feed started with period {:?}", self.period);

        while !*stop.borrow() {
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let snapshot = self.tick();
                    ticks += 1;
                    debug!(
                        price = %snapshot.price,
                        volume = snapshot.volume,
                        "Instrument updated"
                    );
                    publish(
                        self.events.as_ref(),
                        MarketEvent::Tick {
                            symbol: self.instrument.symbol().to_string(),
                            snapshot,
                            timestamp: chrono::Utc::now(),
                        },
                    );
                }
            }
        }

        info!("Feed stopped after {} updates", ticks);
        ticks
    }
}

/// Control handle for a running feed
///
/// Dropping the handle also stops the feed.
pub struct FeedHandle {
    symbol: String,
    stop: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl FeedHandle {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Signal the feed to stop after its in-flight update, if any
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Stop the feed and wait for it to exit. Returns the number of updates
    /// it committed.
    pub async fn shutdown(self) -> Result<u64> {
        self.stop();
        self.task
            .await
            .map_err(|e| SimError::Internal(format!("feed {} failed: {}", self.symbol, e)))
    }
}
