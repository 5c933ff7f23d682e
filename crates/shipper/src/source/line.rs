//! LineSource trait — abstract interface for producers of raw log lines.
//!
//! `file.rs` provides the real tail-a-growing-file implementation.
//! `fake.rs` provides a test double that replays canned lines.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};

use crate::error::ShipperError;

/// One newline-delimited record from the source, delimiter stripped.
/// Ordering in the channel is significant; each line is consumed exactly once.
pub type RawLine = Bytes;

/// A producer of raw log lines.
///
/// `run` drives the source until shutdown fires or a fatal error occurs,
/// pushing every complete line into `tx` in append order. Returning drops
/// `tx`, which is how downstream stages learn the source has stopped.
///
/// Object-safe thanks to the `Pin<Box<…>>` return; implementations must be
/// `Send` so the pipeline can spawn them onto the runtime.
pub trait LineSource: Send {
    fn run(
        self: Box<Self>,
        tx: mpsc::Sender<RawLine>,
        shutdown: watch::Receiver<bool>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ShipperError>> + Send>>;
}
