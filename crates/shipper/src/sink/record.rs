//! RecordSink trait — abstract interface for record consumers.
//!
//! `console.rs` provides the stdout implementation.
//! `fake.rs` provides a test double with failure injection.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::parser::model::LogRecord;

/// Sink-side failures are recoverable by policy: the emitter retries and,
/// when retries are exhausted, drops the record with a diagnostic. They
/// never tear the pipeline down.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Sink rejected record: {0}")]
    Rejected(String),
}

/// A consumer of parsed records with a single fallible submit operation.
///
/// Object-safe thanks to the `Pin<Box<…>>` return; implementations must be
/// `Send + Sync` so the emitter can hold an `Arc<dyn RecordSink>`.
pub trait RecordSink: Send + Sync {
    fn submit<'a>(
        &'a self,
        record: &'a LogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>>;
}
