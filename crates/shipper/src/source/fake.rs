//! Fake — test double for line sources.
//!
//! Provides a deterministic [`FakeSource`] that implements [`LineSource`]
//! by replaying canned lines. Useful for unit-testing the pipeline without
//! touching the filesystem.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::{mpsc, watch};

use crate::error::ShipperError;
use crate::source::line::{LineSource, RawLine};

/// A canned line source for deterministic testing.
///
/// Sends every seeded line in order, then either returns (closing the
/// channel, which lets downstream stages drain and finish) or, with
/// `hold_open`, waits for the shutdown signal the way a live tail would.
pub struct FakeSource {
    lines: Vec<RawLine>,
    hold_open: bool,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            hold_open: false,
        }
    }

    /// Seed a line to be replayed.
    pub fn push_line(mut self, line: impl AsRef<[u8]>) -> Self {
        self.lines.push(RawLine::copy_from_slice(line.as_ref()));
        self
    }

    /// Keep running after the last line until shutdown fires.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

impl Default for FakeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for FakeSource {
    fn run(
        self: Box<Self>,
        tx: mpsc::Sender<RawLine>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ShipperError>> + Send>> {
        Box::pin(async move {
            for line in self.lines {
                tokio::select! {
                    res = tx.send(line) => {
                        if res.is_err() {
                            return Ok(());
                        }
                    }
                    _ = shutdown.changed() => return Ok(()),
                }
            }

            if self.hold_open {
                let _ = shutdown.changed().await;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_lines_in_order() {
        let source: Box<dyn LineSource> =
            Box::new(FakeSource::new().push_line("one").push_line("two"));
        let (tx, mut rx) = mpsc::channel(8);
        let (_stop_tx, stop_rx) = watch::channel(false);

        source.run(tx, stop_rx).await.unwrap();

        assert_eq!(&rx.recv().await.unwrap()[..], b"one");
        assert_eq!(&rx.recv().await.unwrap()[..], b"two");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_hold_open_waits_for_shutdown() {
        let source: Box<dyn LineSource> = Box::new(FakeSource::new().push_line("one").hold_open());
        let (tx, mut rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(source.run(tx, stop_rx));
        assert_eq!(&rx.recv().await.unwrap()[..], b"one");
        assert!(!handle.is_finished());

        stop_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }
}
