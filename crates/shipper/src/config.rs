use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::ShipperError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipperConfig {
    /// Path of the access log to tail.
    pub source_path: String,
    /// Fixed UTC offset applied to parsed timestamps, e.g. "+00:00" or "-05:00".
    pub timezone_offset: String,
    /// How long the tailer waits before re-checking the file for new data.
    pub poll_interval_ms: u64,
    /// Capacity of the raw-line and record queues. A full queue suspends
    /// the producing stage (block-on-full backpressure).
    pub queue_capacity: usize,
    /// Sink connection string. "console" writes line protocol to stdout.
    pub sink_dsn: String,
    /// How many times the emitter retries a failed submit before dropping
    /// the record.
    pub submit_retries: u32,
}

impl ShipperConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ShipperError> {
        let config_path = std::env::var("SHIPPER_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/tailship/shipper.toml".to_string());

        let mut config = if std::path::Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!(
                "Config file not found at {}, using environment variables",
                config_path
            );
            Self::from_env()
        };

        // Environment variables override file config for critical settings
        if let Ok(path) = std::env::var("SHIPPER_SOURCE_PATH") {
            config.source_path = path;
        }
        if let Ok(dsn) = std::env::var("SHIPPER_SINK_DSN") {
            config.sink_dsn = dsn;
        }
        if let Ok(offset) = std::env::var("SHIPPER_TIMEZONE_OFFSET") {
            config.timezone_offset = offset;
        }
        if let Some(ms) = std::env::var("SHIPPER_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.poll_interval_ms = ms;
        }
        if let Some(capacity) = std::env::var("SHIPPER_QUEUE_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.queue_capacity = capacity;
        }
        if let Some(retries) = std::env::var("SHIPPER_SUBMIT_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.submit_retries = retries;
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ShipperError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ShipperError::Config(format!("cannot read {}: {}", path, e)))?;

        toml::from_str(&contents)
            .map_err(|e| ShipperError::Config(format!("cannot parse {}: {}", path, e)))
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        Self {
            source_path: std::env::var("SHIPPER_SOURCE_PATH")
                .unwrap_or_else(|_| "access.log".to_string()),
            timezone_offset: std::env::var("SHIPPER_TIMEZONE_OFFSET")
                .unwrap_or_else(|_| "+00:00".to_string()),
            poll_interval_ms: std::env::var("SHIPPER_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),
            queue_capacity: std::env::var("SHIPPER_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024),
            sink_dsn: std::env::var("SHIPPER_SINK_DSN")
                .unwrap_or_else(|_| "console".to_string()),
            submit_retries: std::env::var("SHIPPER_SUBMIT_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        }
    }

    /// Validate that configuration values are sane
    pub fn validate(&self) -> Result<(), String> {
        if self.source_path.is_empty() {
            return Err("source_path must not be empty".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be > 0".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be > 0".to_string());
        }
        if self.sink_dsn.is_empty() {
            return Err("sink_dsn must not be empty".to_string());
        }
        self.parse_offset().map(|_| ())
    }

    /// Parse `timezone_offset` into a chrono offset.
    pub fn parse_offset(&self) -> Result<FixedOffset, String> {
        parse_utc_offset(&self.timezone_offset)
            .ok_or_else(|| format!("invalid timezone_offset: {:?}", self.timezone_offset))
    }
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            source_path: "access.log".to_string(),
            timezone_offset: "+00:00".to_string(),
            poll_interval_ms: 500,
            queue_capacity: 1024,
            sink_dsn: "console".to_string(),
            submit_retries: 3,
        }
    }
}

/// Parse "+HH:MM" / "-HH:MM" (the ":" is optional) into a FixedOffset.
fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1i32, &s[1..]),
        b'-' => (-1i32, &s[1..]),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
