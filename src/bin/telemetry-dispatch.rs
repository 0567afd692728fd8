//! # Telemetry Dispatch Service
//!
//! Runs the poll loop against a pgmq queue and the HTTP workflow service
//! until Ctrl+C or SIGTERM.
//!
//! ## Usage
//!
//! ```bash
//! TELEMETRY_DISPATCH_CONFIG=config/telemetry-dispatch.toml telemetry-dispatch
//!
//! # or purely from the environment
//! TELEMETRY_DISPATCH__QUEUE__DATABASE_URL=postgresql://localhost/telemetry \
//! TELEMETRY_DISPATCH__QUEUE__QUEUE_NAME=ecg_traces \
//! TELEMETRY_DISPATCH__WORKFLOW__BASE_URL=http://orchestrator:8080 \
//! TELEMETRY_DISPATCH__WORKFLOW__WORKFLOW_ID=ecg-analysis \
//! TELEMETRY_DISPATCH__FILTER__EXPECTED_DEVICE_ID=IoTSimulator \
//! TELEMETRY_DISPATCH__FILTER__SUBJECT_ID=patient-123 \
//! telemetry-dispatch
//! ```

use anyhow::Context;
use std::sync::Arc;
use telemetry_dispatch::clock::SystemClock;
use telemetry_dispatch::config::ConfigLoader;
use telemetry_dispatch::logging;
use telemetry_dispatch::messaging::PgmqQueueClient;
use telemetry_dispatch::orchestration::{build_poll_loop, build_workflow_client};
use telemetry_dispatch::shutdown::ShutdownSignal;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_structured_logging();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %logging::get_environment(),
        "Starting telemetry dispatch service"
    );

    let config = ConfigLoader::from_env()
        .load()
        .context("Failed to load configuration")?;

    let queue = PgmqQueueClient::connect(&config.queue)
        .await
        .context("Failed to connect to message queue")?;
    let workflow = build_workflow_client(&config.workflow)?;

    let poll_loop = build_poll_loop(
        &config,
        Arc::new(queue),
        Arc::new(workflow),
        Arc::new(SystemClock),
    )?;

    let shutdown = ShutdownSignal::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, finishing in-flight messages");
        trigger.trigger();
    });

    let totals = poll_loop.run(shutdown).await;
    info!(
        dispatched = totals.dispatched,
        rejected = totals.rejected,
        failures = totals.transient_failures + totals.permanent_failures,
        "Telemetry dispatch service stopped"
    );

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
}
