//! AccessLogParser — the fixed line grammar and field conversion.
//!
//! One regex, compiled once, matching lines of the shape:
//!
//! ```text
//! 172.0.0.12 - - [04/Mar/2018:13:49:52 +0000] http "GET /foo?query=t HTTP/1.0" 200 2133 "-" "KeepAliveClient" "-" 1.005 1.854
//! ```
//!
//! A structural mismatch drops the line (one diagnostic, no record). A
//! field-level conversion failure keeps the record with an explicit
//! default and logs a diagnostic.

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use tracing::warn;

use crate::parser::model::{LogRecord, ParseError};

/// Capture groups: client, two identity fields, bracketed timestamp,
/// scheme, quoted request line, status, byte count, quoted referrer,
/// quoted agent, quoted dash-or-numeric token, upstream time, request time.
const ACCESS_LOG_GRAMMAR: &str = r#"([\d\.]+)\s+([^ \[]+)\s+([^ \[]+)\s+\[([^\]]+)\]\s+([a-z]+)\s+"([^"]+)"\s+(\d{3})\s+(\d+)\s+"([^"]+)"\s+"(.*?)"\s+"([\d\.-]+)"\s+([\d\.-]+)\s+([\d\.-]+)"#;

/// Timestamp layout derived from the literal line above.
const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

pub struct AccessLogParser {
    grammar: Regex,
    /// UTC offset records are localized to.
    offset: FixedOffset,
}

impl AccessLogParser {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            grammar: Regex::new(ACCESS_LOG_GRAMMAR).expect("access log grammar is a valid regex"),
            offset,
        }
    }

    /// Parse one raw line into a [`LogRecord`].
    ///
    /// `Err` means the line produced no record; the caller logs it and
    /// moves on.
    pub fn parse(&self, raw: &[u8]) -> Result<LogRecord, ParseError> {
        let text = std::str::from_utf8(raw).map_err(|_| ParseError::NonUtf8)?;

        let groups = self.grammar.captures(text).ok_or(ParseError::NoMatch)?;

        let timestamp = self.parse_timestamp(&groups[4]);
        let (method, path) = split_request_line(&groups[6]);

        let bytes_sent = match groups[8].parse::<u64>() {
            Ok(n) => n,
            Err(e) => {
                warn!(field = &groups[8], error = %e, "byte count did not parse, defaulting to 0");
                0
            }
        };

        Ok(LogRecord {
            timestamp,
            bytes_sent,
            client_addr: groups[1].to_string(),
            method,
            path,
            scheme: groups[5].to_string(),
            status: groups[7].to_string(),
            upstream_time: parse_seconds(&groups[12]),
            request_time: parse_seconds(&groups[13]),
        })
    }

    fn parse_timestamp(&self, field: &str) -> Option<DateTime<FixedOffset>> {
        match DateTime::parse_from_str(field, TIMESTAMP_FORMAT) {
            Ok(ts) => Some(ts.with_timezone(&self.offset)),
            Err(e) => {
                warn!(field, error = %e, "timestamp did not parse, forwarding record without one");
                None
            }
        }
    }
}

/// Split `"GET /foo?query=t HTTP/1.0"` into method and path; the protocol
/// token is not part of the record.
fn split_request_line(request: &str) -> (String, String) {
    let mut parts = request.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(method), Some(path)) => (method.to_string(), path.to_string()),
        _ => {
            warn!(request, "malformed request line, forwarding record with empty method/path");
            (String::new(), String::new())
        }
    }
}

/// A timing field: "-" is the documented absent form, anything else is
/// seconds as a float.
fn parse_seconds(field: &str) -> Option<f64> {
    if field == "-" {
        return None;
    }
    match field.parse::<f64>() {
        Ok(secs) => Some(secs),
        Err(e) => {
            warn!(field, error = %e, "timing field did not parse");
            None
        }
    }
}
