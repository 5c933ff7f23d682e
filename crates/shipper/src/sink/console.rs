//! ConsoleSink — writes records as InfluxDB line-protocol text to stdout.
//!
//! The reference sink: same textual form a time-series ingest would accept,
//! without the wire protocol.

use std::future::Future;
use std::pin::Pin;

use tokio::io::AsyncWriteExt;

use crate::parser::model::LogRecord;
use crate::sink::record::{RecordSink, SinkError};

const MEASUREMENT: &str = "access";

pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSink for ConsoleSink {
    fn submit<'a>(
        &'a self,
        record: &'a LogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>> {
        Box::pin(async move {
            let mut line = format_line_protocol(record);
            line.push('\n');

            let mut out = tokio::io::stdout();
            out.write_all(line.as_bytes())
                .await
                .map_err(|e| SinkError::Unavailable(e.to_string()))?;
            out.flush()
                .await
                .map_err(|e| SinkError::Unavailable(e.to_string()))
        })
    }
}

/// Render one record as an InfluxDB line-protocol point.
///
/// Tags carry the low-cardinality dimensions; the path and client address
/// go into fields. The trailing timestamp (nanoseconds) is omitted when
/// the source line's timestamp did not parse.
fn format_line_protocol(record: &LogRecord) -> String {
    let mut line = String::from(MEASUREMENT);

    for (key, value) in [
        ("method", &record.method),
        ("scheme", &record.scheme),
        ("status", &record.status),
    ] {
        if !value.is_empty() {
            line.push(',');
            line.push_str(key);
            line.push('=');
            line.push_str(&escape_tag(value));
        }
    }

    line.push_str(&format!(
        " client=\"{}\",path=\"{}\",bytes_sent={}i",
        escape_field(&record.client_addr),
        escape_field(&record.path),
        record.bytes_sent
    ));
    if let Some(secs) = record.upstream_time {
        line.push_str(&format!(",upstream_time={secs}"));
    }
    if let Some(secs) = record.request_time {
        line.push_str(&format!(",request_time={secs}"));
    }

    if let Some(ts) = record.timestamp {
        if let Some(nanos) = ts.timestamp_nanos_opt() {
            line.push_str(&format!(" {nanos}"));
        }
    }

    line
}

/// Tag values escape comma, space, and equals.
fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// String field values escape backslash and double quote.
fn escape_field(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn sample_record() -> LogRecord {
        LogRecord {
            timestamp: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2018, 3, 4, 13, 49, 52)
                .single(),
            bytes_sent: 2133,
            client_addr: "172.0.0.12".to_string(),
            method: "GET".to_string(),
            path: "/foo?query=t".to_string(),
            scheme: "http".to_string(),
            status: "200".to_string(),
            upstream_time: Some(1.005),
            request_time: Some(1.854),
        }
    }

    #[test]
    fn test_line_protocol_shape() {
        let line = format_line_protocol(&sample_record());
        assert_eq!(
            line,
            "access,method=GET,scheme=http,status=200 \
             client=\"172.0.0.12\",path=\"/foo?query=t\",bytes_sent=2133i,\
             upstream_time=1.005,request_time=1.854 1520171392000000000"
        );
    }

    #[test]
    fn test_missing_timestamp_omits_trailer() {
        let mut record = sample_record();
        record.timestamp = None;
        let line = format_line_protocol(&record);
        assert!(line.ends_with("request_time=1.854"));
    }

    #[test]
    fn test_absent_timings_omitted() {
        let mut record = sample_record();
        record.upstream_time = None;
        record.request_time = None;
        let line = format_line_protocol(&record);
        assert!(!line.contains("upstream_time"));
        assert!(!line.contains("request_time"));
    }

    #[test]
    fn test_empty_method_drops_tag() {
        let mut record = sample_record();
        record.method = String::new();
        let line = format_line_protocol(&record);
        assert!(!line.contains("method="));
        assert!(line.starts_with("access,scheme=http"));
    }

    #[test]
    fn test_tag_and_field_escaping() {
        assert_eq!(escape_tag("a b,c=d"), "a\\ b\\,c\\=d");
        assert_eq!(escape_field(r#"say "hi" \now"#), r#"say \"hi\" \\now"#);
    }

    #[tokio::test]
    async fn test_submit_succeeds() {
        let sink = ConsoleSink::new();
        sink.submit(&sample_record()).await.unwrap();
    }
}
