//! Error — fatal pipeline error types.
//!
//! Per-line parse problems and sink hiccups are diagnostics, not errors;
//! only conditions that make further progress impossible live here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShipperError {
    #[error("Cannot open source file {path}: {source}")]
    OpenSource {
        path: String,
        source: std::io::Error,
    },

    #[error("Read error on source file: {0}")]
    ReadSource(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Convenience type alias
pub type ShipperResult<T> = Result<T, ShipperError>;
