//! procsupd: runs every app of a declaration until SIGINT/SIGTERM

#[path = "procsupd/config.rs"]
mod config;
#[path = "procsupd/signals.rs"]
mod signals;

use config::{DaemonConfig, LogFormat};
use procsup_engine::infrastructure::{load_process_specs, SysinfoUsageReader, TokioProcessExecutor};
use procsup_engine::SupervisorRegistry;
use signals::ShutdownSignals;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DaemonConfig::from_env();
    init_tracing(&config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid daemon configuration");
        return Err(e.into());
    }

    info!(
        config_file = %config.config_file,
        version = env!("CARGO_PKG_VERSION"),
        "Starting procsupd"
    );

    // Configuration errors abort before any instance starts
    let specs = load_process_specs(&config.config_file).map_err(|e| {
        error!(error = %e, "Failed to load declaration");
        e
    })?;

    let mut shutdown = ShutdownSignals::install()?;

    let registry = SupervisorRegistry::from_specs(
        specs,
        Arc::new(TokioProcessExecutor::new()),
        Arc::new(SysinfoUsageReader::new()),
    );
    registry.start_all().await?;

    let received = shutdown.recv().await;
    info!(signal = received, "Received shutdown signal, initiating graceful shutdown");

    registry.stop_all().await;
    info!("procsupd exited");
    Ok(())
}

fn init_tracing(config: &DaemonConfig) {
    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new(procsup_engine::constants::daemon::DEFAULT_LOG_LEVEL));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
