//! Producer side: the harvest session
//!
//! One session owns the current aggregator and is the only writer into it.
//! Each time the entropy target is reached the finished slice moves into
//! the slotter, the reservoir level is reported, and a fresh aggregator
//! takes over for the next slice.

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info};

use entropyd_core::aggregator::{Aggregator, Tunables};
use entropyd_core::counter::RequestCounter;
use entropyd_core::events::InputEvent;
use entropyd_core::slotter::Slotter;
use entropyd_core::Result;

pub struct HarvestSession {
    slotter: Slotter,
    counter: RequestCounter,
    tunables: Tunables,
    /// Cursor position snapshot taken when the session started
    origin: (i32, i32),
    events: mpsc::Receiver<Result<InputEvent>>,
}

impl HarvestSession {
    pub fn new(
        slotter: Slotter,
        counter: RequestCounter,
        tunables: Tunables,
        origin: (i32, i32),
        events: mpsc::Receiver<Result<InputEvent>>,
    ) -> Self {
        Self {
            slotter,
            counter,
            tunables,
            origin,
            events,
        }
    }

    /// Pump events into aggregators until the input source closes
    ///
    /// A failure reported by the input source ends harvesting with an
    /// error; a closed channel is the ordinary end-of-input shutdown.
    pub async fn run(mut self) -> Result<()> {
        let mut aggregator = Aggregator::new(self.origin, self.tunables);
        info!(
            target_bits = aggregator.requested(),
            "harvesting started, feed mouse and key input"
        );

        while let Some(event) = self.events.recv().await {
            let event = event?;

            if aggregator.handle(&event) {
                debug!(
                    entropy_bits = aggregator.entropy(),
                    target_bits = aggregator.requested(),
                    "contributing sample"
                );
            }

            if aggregator.enough_entropy() {
                aggregator.prepare_slice();
                let slice = aggregator.take_slice();
                self.slotter.push(Bytes::copy_from_slice(&slice));

                let snapshot = self.counter.get();
                info!(
                    available = self.slotter.available(),
                    requests = snapshot.count,
                    served = snapshot.success_count,
                    "slice completed"
                );

                aggregator = Aggregator::new(self.origin, self.tunables);
            }
        }

        info!("input source closed, harvesting stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entropyd_core::events::MouseSample;
    use entropyd_core::{Error, SLICE_BYTES};

    #[tokio::test]
    async fn test_session_fills_reservoir() {
        let slotter = Slotter::new(SLICE_BYTES);
        let counter = RequestCounter::new();
        let (tx, rx) = mpsc::channel(64);

        let session = HarvestSession::new(
            slotter.clone(),
            counter,
            Tunables::default(),
            (0, 0),
            rx,
        );
        let handle = tokio::spawn(session.run());

        // 107 contributing mouse samples complete exactly one slice
        for i in 1..=107i32 {
            let event = InputEvent::Mouse(MouseSample {
                x: i,
                y: i,
                tick_ms: i as u32 * 150,
            });
            tx.send(Ok(event)).await.expect("session hung up");
        }
        drop(tx);

        handle.await.expect("task panicked").expect("session failed");
        assert_eq!(slotter.available(), SLICE_BYTES as u32);
    }

    #[tokio::test]
    async fn test_session_restarts_after_each_slice() {
        let slotter = Slotter::new(SLICE_BYTES);
        let counter = RequestCounter::new();
        let (tx, rx) = mpsc::channel(64);

        let session = HarvestSession::new(
            slotter.clone(),
            counter,
            Tunables::default(),
            (0, 0),
            rx,
        );
        let handle = tokio::spawn(session.run());

        // Enough contributing samples for two full slices
        for i in 1..=214i32 {
            let event = InputEvent::Mouse(MouseSample {
                x: i,
                y: i,
                tick_ms: i as u32 * 150,
            });
            tx.send(Ok(event)).await.expect("session hung up");
        }
        drop(tx);

        handle.await.expect("task panicked").expect("session failed");
        assert_eq!(slotter.available(), 2 * SLICE_BYTES as u32);

        // Slices from distinct aggregator lifetimes differ
        let mut first = [0u8; SLICE_BYTES];
        let mut second = [0u8; SLICE_BYTES];
        assert!(slotter.request(&mut first));
        assert!(slotter.request(&mut second));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_input_failure_ends_session_with_error() {
        let slotter = Slotter::new(SLICE_BYTES);
        let counter = RequestCounter::new();
        let (tx, rx) = mpsc::channel(64);

        let session = HarvestSession::new(
            slotter.clone(),
            counter,
            Tunables::default(),
            (0, 0),
            rx,
        );
        let handle = tokio::spawn(session.run());

        let event = InputEvent::Mouse(MouseSample {
            x: 1,
            y: 1,
            tick_ms: 150,
        });
        tx.send(Ok(event)).await.expect("session hung up");
        tx.send(Err(Error::Session("stdin read failed: broken".to_string())))
            .await
            .expect("session hung up");

        let result = handle.await.expect("task panicked");
        assert!(matches!(result, Err(Error::Session(_))));
        assert_eq!(slotter.available(), 0);
    }
}
