use shipper::runtime::{boot, stop};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let pipeline = boot::boot()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        stop::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    pipeline.run(shutdown_rx).await?;
    tracing::info!("Pipeline shutdown complete");
    Ok(())
}
