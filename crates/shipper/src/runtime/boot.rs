//! Boot — logging init, config load, pipeline construction.

use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ShipperConfig;
use crate::error::{ShipperError, ShipperResult};
use crate::parser::AccessLogParser;
use crate::pipeline::Pipeline;
use crate::sink;
use crate::source::FileTailer;

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shipper=info".into()),
        )
        // stdout belongs to the console sink; diagnostics go to stderr.
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load config, validate it, and assemble the tail → parse → emit pipeline.
pub fn boot() -> ShipperResult<Pipeline> {
    info!("Starting tailship shipper v0.1.0");

    let config = ShipperConfig::load()?;
    config.validate().map_err(ShipperError::Config)?;
    info!(
        "Loaded configuration: source_path={}, sink_dsn={}, poll_interval={}ms, queue_capacity={}",
        config.source_path, config.sink_dsn, config.poll_interval_ms, config.queue_capacity
    );

    build_pipeline(&config)
}

/// Assemble a pipeline from an already-validated config.
pub fn build_pipeline(config: &ShipperConfig) -> ShipperResult<Pipeline> {
    let offset = config.parse_offset().map_err(ShipperError::Config)?;

    let tailer = FileTailer::new(
        config.source_path.as_str(),
        Duration::from_millis(config.poll_interval_ms),
    );
    let parser = AccessLogParser::new(offset);
    let sink = sink::from_dsn(&config.sink_dsn)?;

    Ok(Pipeline::new(
        Box::new(tailer),
        parser,
        sink,
        config.queue_capacity,
        config.submit_retries,
    ))
}
