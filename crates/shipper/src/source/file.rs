//! FileTailer — live tail of a growing log file.
//!
//! Opens the file, seeks to the current end (history is never replayed),
//! then reads complete lines as they are appended. At end-of-stream it
//! waits one poll interval and retries; it never terminates on EOF and
//! never emits a line that has not been terminated by its delimiter.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::ShipperError;
use crate::source::line::{LineSource, RawLine};

const READ_CHUNK_BYTES: usize = 8 * 1024;

pub struct FileTailer {
    path: PathBuf,
    poll_interval: Duration,
}

impl FileTailer {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
        }
    }

    async fn tail(
        self,
        tx: mpsc::Sender<RawLine>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ShipperError> {
        let mut file = File::open(&self.path)
            .await
            .map_err(|e| ShipperError::OpenSource {
                path: self.path.display().to_string(),
                source: e,
            })?;

        // Live-tail policy: start at the current end of file.
        let mut pos = file.seek(SeekFrom::End(0)).await?;
        info!(path = %self.path.display(), offset = pos, "starting tailer at end of file");

        // Bytes of a line whose delimiter has not arrived yet.
        let mut pending: Vec<u8> = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK_BYTES];

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            // Any error besides end-of-stream is fatal (ReadSource).
            let n = file.read(&mut chunk).await?;

            if n == 0 {
                let len = file.metadata().await?.len();
                if len < pos {
                    warn!(
                        path = %self.path.display(),
                        previous_offset = pos,
                        current_size = len,
                        "file truncated; resuming from new end of file"
                    );
                    pending.clear();
                    pos = file.seek(SeekFrom::End(0)).await?;
                }

                tokio::select! {
                    _ = sleep(self.poll_interval) => {}
                    _ = shutdown.changed() => return Ok(()),
                }
                continue;
            }

            pos += n as u64;
            pending.extend_from_slice(&chunk[..n]);

            while let Some(idx) = pending.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = pending.drain(..=idx).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }

                tokio::select! {
                    res = tx.send(RawLine::from(line)) => {
                        // Receiver gone: the pipeline is shutting down.
                        if res.is_err() {
                            return Ok(());
                        }
                    }
                    _ = shutdown.changed() => return Ok(()),
                }
            }
        }
    }
}

impl LineSource for FileTailer {
    fn run(
        self: Box<Self>,
        tx: mpsc::Sender<RawLine>,
        shutdown: watch::Receiver<bool>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ShipperError>> + Send>> {
        Box::pin(self.tail(tx, shutdown))
    }
}
