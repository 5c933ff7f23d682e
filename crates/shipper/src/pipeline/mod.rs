//! Pipeline — tail → parse → emit wiring.
//!
//! Three tasks joined by two bounded channels. Values move through each
//! channel exactly once, in append order; there is no other shared state
//! between stages. A full channel suspends the producing stage
//! (block-on-full backpressure).
//!
//! Shutdown flows forward: the source observes the signal and returns,
//! which closes the line channel; the parser drains and closes the record
//! channel; the emitter drains and stops. The emitter additionally watches
//! the signal so a stalled or retrying sink cannot hold shutdown hostage.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::error::{ShipperError, ShipperResult};
use crate::parser::model::LogRecord;
use crate::parser::AccessLogParser;
use crate::sink::record::RecordSink;
use crate::source::line::{LineSource, RawLine};

/// Base delay between submit retries; grows linearly with the attempt.
const SUBMIT_BACKOFF: Duration = Duration::from_millis(200);

pub struct Pipeline {
    source: Box<dyn LineSource>,
    parser: AccessLogParser,
    sink: Arc<dyn RecordSink>,
    queue_capacity: usize,
    submit_retries: u32,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn LineSource>,
        parser: AccessLogParser,
        sink: Arc<dyn RecordSink>,
        queue_capacity: usize,
        submit_retries: u32,
    ) -> Self {
        Self {
            source,
            parser,
            sink,
            queue_capacity,
            submit_retries,
        }
    }

    /// Run all three stages until the source stops (shutdown signal or
    /// fatal source error) and the queues have drained.
    ///
    /// The first fatal error is surfaced to the caller after the other
    /// stages have stopped; per-line and sink-side problems never end up
    /// here, they are diagnostics only.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> ShipperResult<()> {
        let (line_tx, line_rx) = mpsc::channel::<RawLine>(self.queue_capacity);
        let (record_tx, record_rx) = mpsc::channel::<LogRecord>(self.queue_capacity);

        let tail_task = tokio::spawn(self.source.run(line_tx, shutdown.clone()));
        let parse_task = tokio::spawn(parse_loop(self.parser, line_rx, record_tx));
        let emit_task = tokio::spawn(emit_loop(
            self.sink,
            record_rx,
            shutdown,
            self.submit_retries,
        ));

        // The tailer returning, for any reason, closes the line channel and
        // lets the downstream stages drain deterministically.
        let tail_result = match tail_task.await {
            Ok(result) => result,
            Err(e) => Err(ShipperError::Internal(format!("tail task failed: {e}"))),
        };
        if let Err(e) = &tail_result {
            error!(error = %e, "source stage failed; draining remaining stages");
        }

        if let Err(e) = parse_task.await {
            return Err(ShipperError::Internal(format!("parse task failed: {e}")));
        }
        if let Err(e) = emit_task.await {
            return Err(ShipperError::Internal(format!("emit task failed: {e}")));
        }

        tail_result
    }
}

/// Parse stage: drain raw lines until the channel closes.
///
/// Grammar mismatches drop the line with one diagnostic and never stop
/// the loop. Upstream closure is this stage's shutdown signal, so it
/// suspends only while waiting for the next line.
async fn parse_loop(
    parser: AccessLogParser,
    mut rx: mpsc::Receiver<RawLine>,
    tx: mpsc::Sender<LogRecord>,
) {
    while let Some(raw) = rx.recv().await {
        match parser.parse(&raw) {
            Ok(record) => {
                if tx.send(record).await.is_err() {
                    warn!("record queue closed; parser stopping early");
                    return;
                }
            }
            Err(e) => {
                warn!(
                    line = %String::from_utf8_lossy(&raw),
                    error = %e,
                    "dropping unparsable line"
                );
            }
        }
    }
    debug!("line queue closed; parser stopping");
}

/// Emit stage: forward records to the sink in FIFO order.
///
/// Failed submits are retried with linear backoff; once retries are
/// exhausted the record is dropped with a diagnostic and the loop goes on.
/// The shutdown signal pre-empts pending submits and backoff waits only,
/// so a healthy sink still gets the queue drained.
async fn emit_loop(
    sink: Arc<dyn RecordSink>,
    mut rx: mpsc::Receiver<LogRecord>,
    mut shutdown: watch::Receiver<bool>,
    retries: u32,
) {
    while let Some(record) = rx.recv().await {
        let mut attempt: u32 = 0;
        loop {
            let result = tokio::select! {
                biased;
                res = sink.submit(&record) => res,
                _ = shutdown.changed() => {
                    warn!("shutdown pre-empted a pending submit; emitter stopping");
                    return;
                }
            };

            match result {
                Ok(()) => break,
                Err(e) => {
                    attempt += 1;
                    if attempt > retries {
                        error!(
                            error = %e,
                            status = %record.status,
                            "submit retries exhausted; dropping record"
                        );
                        break;
                    }
                    warn!(error = %e, attempt, "submit failed; retrying");
                    tokio::select! {
                        _ = sleep(SUBMIT_BACKOFF * attempt) => {}
                        _ = shutdown.changed() => {
                            warn!("shutdown during submit backoff; emitter stopping");
                            return;
                        }
                    }
                }
            }
        }
    }
    debug!("record queue closed; emitter stopping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::fake::FakeSink;
    use crate::source::fake::FakeSource;
    use chrono::FixedOffset;
    use tokio::time::timeout;

    fn utc_parser() -> AccessLogParser {
        AccessLogParser::new(FixedOffset::east_opt(0).unwrap())
    }

    fn good_line(path: &str) -> String {
        format!(
            "172.0.0.12 - - [04/Mar/2018:13:49:52 +0000] http \
             \"GET {path} HTTP/1.0\" 200 2133 \"-\" \"KeepAliveClient\" \"-\" 1.005 1.854"
        )
    }

    #[tokio::test]
    async fn test_end_to_end_sample_line() {
        let source = Box::new(FakeSource::new().push_line(good_line("/foo?query=t")));
        let sink = FakeSink::new();
        let pipeline = Pipeline::new(source, utc_parser(), sink.clone(), 16, 3);
        let (_stop_tx, stop_rx) = watch::channel(false);

        pipeline.run(stop_rx).await.unwrap();

        let accepted = sink.accepted().await;
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].bytes_sent, 2133);
        assert_eq!(accepted[0].status, "200");
        assert!(accepted[0].timestamp.is_some());
    }

    #[tokio::test]
    async fn test_ordering_survives_malformed_lines() {
        // 10 well-formed lines interleaved with 5 malformed ones.
        let mut source = FakeSource::new();
        for i in 0..10 {
            source = source.push_line(good_line(&format!("/r{i}")));
            if i % 2 == 0 {
                source = source.push_line(format!("malformed junk {i}"));
            }
        }
        let sink = FakeSink::new();
        let pipeline = Pipeline::new(Box::new(source), utc_parser(), sink.clone(), 4, 3);
        let (_stop_tx, stop_rx) = watch::channel(false);

        pipeline.run(stop_rx).await.unwrap();

        let accepted = sink.accepted().await;
        assert_eq!(accepted.len(), 10);
        for (i, record) in accepted.iter().enumerate() {
            assert_eq!(record.path, format!("/r{i}"));
        }
    }

    #[tokio::test]
    async fn test_empty_source_yields_no_records() {
        let sink = FakeSink::new();
        let pipeline = Pipeline::new(
            Box::new(FakeSource::new()),
            utc_parser(),
            sink.clone(),
            16,
            3,
        );
        let (_stop_tx, stop_rx) = watch::channel(false);

        pipeline.run(stop_rx).await.unwrap();
        assert!(sink.accepted().await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_retry_then_success() {
        let source = Box::new(FakeSource::new().push_line(good_line("/retry")));
        let sink = FakeSink::new();
        sink.fail_next(1).await;
        let pipeline = Pipeline::new(source, utc_parser(), sink.clone(), 16, 3);
        let (_stop_tx, stop_rx) = watch::channel(false);

        pipeline.run(stop_rx).await.unwrap();

        assert_eq!(sink.failures_seen().await, 1);
        let accepted = sink.accepted().await;
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].path, "/retry");
    }

    #[tokio::test]
    async fn test_exhausted_retries_drop_record_but_not_pipeline() {
        let source = Box::new(
            FakeSource::new()
                .push_line(good_line("/doomed"))
                .push_line(good_line("/survivor")),
        );
        let sink = FakeSink::new();
        // One initial attempt plus three retries, all failing.
        sink.fail_next(4).await;
        let pipeline = Pipeline::new(source, utc_parser(), sink.clone(), 16, 3);
        let (_stop_tx, stop_rx) = watch::channel(false);

        pipeline.run(stop_rx).await.unwrap();

        assert_eq!(sink.failures_seen().await, 4);
        let accepted = sink.accepted().await;
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].path, "/survivor");
    }

    #[tokio::test]
    async fn test_shutdown_stops_held_open_source() {
        let source = Box::new(FakeSource::new().push_line(good_line("/last")).hold_open());
        let sink = FakeSink::new();
        let pipeline = Pipeline::new(source, utc_parser(), sink.clone(), 16, 3);
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(pipeline.run(stop_rx));

        // Wait for the record to flow through, then signal shutdown.
        timeout(Duration::from_secs(2), async {
            while sink.accepted().await.is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("record never reached the sink");

        stop_tx.send(true).unwrap();
        timeout(Duration::from_secs(2), handle)
            .await
            .expect("pipeline did not stop after shutdown")
            .unwrap()
            .unwrap();
    }
}
