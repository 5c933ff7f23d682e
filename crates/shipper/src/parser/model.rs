use chrono::{DateTime, FixedOffset};
use thiserror::Error;

/// Structured result of parsing one access-log line.
///
/// Built only from lines that matched the full grammar. Field-level
/// conversion failures are tolerated with explicit defaults so the byte
/// count and status are never lost to a cosmetic timestamp problem.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Request timestamp localized to the configured offset; `None` when
    /// the timestamp text did not parse.
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Response body size in bytes; 0 when the field did not parse.
    pub bytes_sent: u64,
    pub client_addr: String,
    pub method: String,
    pub path: String,
    pub scheme: String,
    pub status: String,
    /// Upstream response time in seconds; `None` for the "-" placeholder.
    pub upstream_time: Option<f64>,
    /// Total request time in seconds; `None` for the "-" placeholder.
    pub request_time: Option<f64>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    /// The line did not match the access-log grammar (wrong field count
    /// or malformed structure). The line produces no record.
    #[error("Line does not match access-log grammar")]
    NoMatch,

    #[error("Non-UTF8 content")]
    NonUtf8,
}
