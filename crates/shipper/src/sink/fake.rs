//! Fake — test double for record sinks.
//!
//! Provides a [`FakeSink`] that captures every submitted record in memory
//! and can be told to fail the next N submits, which drives the emitter's
//! retry path in tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::parser::model::LogRecord;
use crate::sink::record::{RecordSink, SinkError};

#[derive(Default)]
struct Inner {
    accepted: Vec<LogRecord>,
    fail_next: u32,
    failures_seen: u32,
}

/// A capture-all sink for deterministic testing.
#[derive(Default)]
pub struct FakeSink {
    inner: Mutex<Inner>,
}

impl FakeSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `n` submits fail with `SinkError::Unavailable`.
    pub async fn fail_next(&self, n: u32) {
        self.inner.lock().await.fail_next = n;
    }

    /// Records accepted so far, in submission order.
    pub async fn accepted(&self) -> Vec<LogRecord> {
        self.inner.lock().await.accepted.clone()
    }

    /// How many submits have been rejected so far.
    pub async fn failures_seen(&self) -> u32 {
        self.inner.lock().await.failures_seen
    }
}

impl RecordSink for FakeSink {
    fn submit<'a>(
        &'a self,
        record: &'a LogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().await;
            if inner.fail_next > 0 {
                inner.fail_next -= 1;
                inner.failures_seen += 1;
                return Err(SinkError::Unavailable("injected failure".to_string()));
            }
            inner.accepted.push(record.clone());
            Ok(())
        })
    }
}
