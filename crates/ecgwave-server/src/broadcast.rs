//! Fan-out of serialized samples to every connected WebSocket client.
//!
//! A [`Broadcaster`] is created once at startup and passed to whoever needs
//! to emit. Each sample is serialized once; subscribers share the bytes.
//! Subscribers that fall behind skip the frames they missed.

use axum::extract::ws::Utf8Bytes;
use tokio::sync::broadcast;

use ecgwave_core::Sample;

/// Frames buffered per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Cloneable handle for emitting samples to all subscribers.
#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<Utf8Bytes>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Serialize `sample` and send it to every subscriber.
    /// Returns how many subscribers received it.
    pub fn emit(&self, sample: &Sample) -> usize {
        match serde_json::to_string(sample) {
            Ok(json) => self.emit_text(json),
            Err(e) => {
                log::error!("failed to serialize sample {}: {e}", sample.timestamp);
                0
            }
        }
    }

    /// Send a pre-serialized frame.
    pub fn emit_text(&self, text: impl Into<Utf8Bytes>) -> usize {
        // An error here only means nobody is listening.
        self.tx.send(text.into()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Utf8Bytes> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecgwave_core::Lead;
    use tokio::sync::broadcast::error::RecvError;

    fn sample(ts: u64) -> Sample {
        Sample::new(ts, [(Lead::I, 0.1), (Lead::AVR, -0.2)].into_iter().collect())
    }

    #[test]
    fn emit_without_subscribers_is_dropped() {
        let b = Broadcaster::default();
        assert_eq!(b.emit(&sample(1)), 0);
        assert_eq!(b.receiver_count(), 0);
    }

    #[tokio::test]
    async fn every_subscriber_gets_the_same_frame() {
        let b = Broadcaster::default();
        let mut rx1 = b.subscribe();
        let mut rx2 = b.clone().subscribe();
        assert_eq!(b.emit(&sample(42)), 2);

        let f1 = rx1.recv().await.unwrap();
        let f2 = rx2.recv().await.unwrap();
        assert_eq!(f1.as_str(), f2.as_str());

        let parsed: Sample = serde_json::from_str(f1.as_str()).unwrap();
        assert_eq!(parsed, sample(42));
    }

    #[tokio::test]
    async fn slow_subscriber_lags_instead_of_blocking() {
        let b = Broadcaster::new(2);
        let mut rx = b.subscribe();
        for ts in 0..5 {
            b.emit(&sample(ts));
        }
        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        let next: Sample = serde_json::from_str(rx.recv().await.unwrap().as_str()).unwrap();
        assert_eq!(next.timestamp, 3);
    }
}
