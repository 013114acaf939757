//! Channel type definitions for inter-task communication

use tokio::sync::mpsc;
use tracing::trace;

use super::types::MarketEvent;

/// Default channel buffer size
pub const DEFAULT_CHANNEL_SIZE: usize = 1000;

pub type EventSender = mpsc::Sender<MarketEvent>;
pub type EventReceiver = mpsc::Receiver<MarketEvent>;

/// Create a new market event channel with the default buffer size
pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_SIZE)
}

/// Create a new market event channel with a custom buffer size
pub fn create_event_channel_with_size(size: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(size.max(1))
}

/// Publish without waiting. Feeds and agents must never block on the reporter,
/// so a full or closed channel drops the event.
pub fn publish(sender: Option<&EventSender>, event: MarketEvent) {
    if let Some(sender) = sender {
        if let Err(e) = sender.try_send(event) {
            trace!("Dropped market event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{LedgerReport, MarketEvent};
    use rust_decimal::Decimal;

    fn finished(name: &str) -> MarketEvent {
        MarketEvent::AgentFinished(LedgerReport {
            username: name.to_string(),
            cash: Decimal::ZERO,
            positions: Vec::new(),
        })
    }

    #[test]
    fn test_publish_drops_when_full() {
        let (tx, mut rx) = create_event_channel_with_size(1);

        publish(Some(&tx), finished("a"));
        publish(Some(&tx), finished("b"));
        publish(None, finished("c"));

        match rx.try_recv() {
            Ok(MarketEvent::AgentFinished(report)) => assert_eq!(report.username, "a"),
            other => panic!("Expected AgentFinished, got {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_publish_after_receiver_dropped() {
        let (tx, rx) = create_event_channel();
        drop(rx);
        publish(Some(&tx), finished("a"));
    }
}
