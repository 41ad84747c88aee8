//! # Service Runtime Binary
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging
//! 2. Load configuration from the environment
//! 3. Start every service (fail fast)
//! 4. Optionally run the demo flow
//! 5. Serve until Ctrl+C, then stop best-effort

use anyhow::{Context, Result};
use service_runtime::{run_demo, RuntimeConfig, ServiceRuntime};
use svc_telemetry::{init_logging, TelemetryConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env().for_service("service-runtime");
    init_logging(&telemetry).context("Failed to initialize logging")?;

    let config = RuntimeConfig::from_env().context("Invalid runtime configuration")?;
    info!(
        dispatch = ?config.dispatch,
        enforcement = ?config.enforcement,
        partitions = config.partitions,
        retention = config.retention,
        "Configuration loaded"
    );

    let runtime = ServiceRuntime::new(&config);
    runtime.start().await?;

    if config.demo {
        if let Err(e) = run_demo(&runtime).await {
            error!(error = %format!("{e:#}"), "Demo flow failed");
        }
    }

    info!("Services are running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
