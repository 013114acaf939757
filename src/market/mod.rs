//! Instruments and the background feeds that move them

pub mod feed;
pub mod instrument;

pub use feed::{FeedHandle, MarketDataFeed, RandomWalk};
pub use instrument::Instrument;
