//! Parser module — turns raw access-log lines into structured records.

pub mod access;
pub mod model;

pub use access::AccessLogParser;
pub use model::{LogRecord, ParseError};
