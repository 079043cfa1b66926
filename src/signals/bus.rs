use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

use super::Signal;
use crate::config::SignalConfig;

/// A published signal with its bus-wide sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalEnvelope {
    /// Publish order on this bus, starting at 1.
    pub sequence: u64,
    /// The payload.
    pub signal: Signal,
}

/// Fire-and-forget fan-out of [`Signal`]s.
///
/// The bus is a transport, not a store: a signal published while nobody is
/// subscribed is simply dropped, and subscribers only see signals published
/// after they attached.
#[derive(Debug)]
pub struct SignalBus {
    next_sequence: AtomicU64,
    sender: broadcast::Sender<SignalEnvelope>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(&SignalConfig::default())
    }
}

impl SignalBus {
    /// Create a bus with the configured per-subscriber buffer.
    pub fn new(config: &SignalConfig) -> Self {
        let (sender, _receiver) = broadcast::channel(config.buffer_capacity.max(1));
        Self {
            next_sequence: AtomicU64::new(0),
            sender,
        }
    }

    /// Attach a subscriber. Dropping the returned handle detaches it.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish to whoever is attached right now, if anyone.
    pub fn publish(&self, signal: Signal) -> SignalEnvelope {
        let envelope = SignalEnvelope {
            sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed) + 1,
            signal,
        };

        let delivered = self.sender.send(envelope.clone()).unwrap_or(0);
        debug!(
            signal = envelope.signal.name(),
            sequence = envelope.sequence,
            subscribers = delivered,
            "Signal published"
        );

        envelope
    }
}

/// Receiving end of a bus subscription.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<SignalEnvelope>,
}

impl Subscription {
    /// Wait for the next signal. Returns `None` once the bus is gone.
    ///
    /// A subscriber that fell behind skips the overwritten signals.
    pub async fn recv(&mut self) -> Option<SignalEnvelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Signal subscriber lagged; skipping missed signals");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next already-published signal without waiting.
    pub fn try_recv(&mut self) -> Option<SignalEnvelope> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => return Some(envelope),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Signal subscriber lagged; skipping missed signals");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    const TEST_TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = SignalBus::default();
        assert_eq!(bus.subscriber_count(), 0);

        let envelope = bus.publish(Signal::GlobalSearchCleared);
        assert_eq!(envelope.sequence, 1);
    }

    #[test]
    fn publish_allocates_monotonic_sequence_numbers() {
        let bus = SignalBus::default();
        let first = bus.publish(Signal::ProjectFilterCleared);
        let second = bus.publish(Signal::GlobalSearchCleared);
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
    }

    #[tokio::test]
    async fn publish_fans_out_to_every_subscriber() {
        let bus = SignalBus::default();
        let mut search_bar = bus.subscribe();
        let mut content_list = bus.subscribe();

        let published = bus.publish(Signal::ProjectFilterSelected {
            project_id: "grid".to_string(),
        });

        let a = timeout(TEST_TIMEOUT, search_bar.recv())
            .await
            .expect("recv timed out")
            .expect("bus closed");
        let b = timeout(TEST_TIMEOUT, content_list.recv())
            .await
            .expect("recv timed out")
            .expect("bus closed");
        assert_eq!(a, published);
        assert_eq!(b, published);
    }

    #[test]
    fn subscribers_only_see_signals_after_attaching() {
        let bus = SignalBus::default();
        bus.publish(Signal::ProjectFilterCleared);

        let mut late = bus.subscribe();
        assert!(late.try_recv().is_none());

        bus.publish(Signal::GlobalSearchCleared);
        assert_eq!(late.try_recv().unwrap().signal, Signal::GlobalSearchCleared);
    }

    #[test]
    fn dropping_subscription_detaches() {
        let bus = SignalBus::default();
        let subscription = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        drop(subscription);
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(Signal::GlobalSearchCleared);
    }

    #[test]
    fn lagging_subscriber_skips_to_retained_signals() {
        let bus = SignalBus::new(&SignalConfig { buffer_capacity: 2 });
        let mut slow = bus.subscribe();

        for i in 0..5 {
            bus.publish(Signal::MyReportsSearch {
                query: format!("q{}", i),
            });
        }

        let first = slow.try_recv().expect("retained signal");
        assert_eq!(first.sequence, 4);
        assert_eq!(slow.try_recv().unwrap().sequence, 5);
        assert!(slow.try_recv().is_none());
    }

    #[tokio::test]
    async fn recv_returns_none_when_bus_dropped() {
        let bus = SignalBus::default();
        let mut subscription = bus.subscribe();
        drop(bus);

        let closed = timeout(TEST_TIMEOUT, subscription.recv())
            .await
            .expect("recv timed out");
        assert!(closed.is_none());
    }
}
