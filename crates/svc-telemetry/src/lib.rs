//! # Service Telemetry
//!
//! Structured logging for the event mesh services, built on `tracing`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use svc_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env().for_service("service-customer");
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | unset | Full filter directive, wins over `BUS_LOG_LEVEL` |
//! | `BUS_LOG_LEVEL` | `info` | Log level filter |
//! | `BUS_JSON_LOGS` | `false` | JSON lines output |
//! | `BUS_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `BUS_SERVICE_NAME` | `customer-event-mesh` | Name in startup logs |

mod config;
mod subscriber;

pub use config::{
    TelemetryConfig, CONSOLE_OUTPUT_ENV, JSON_LOGS_ENV, LOG_LEVEL_ENV, SERVICE_NAME_ENV,
};
pub use subscriber::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{directive}': {reason}")]
    Filter { directive: String, reason: String },

    #[error("Failed to install log subscriber: {0}")]
    SubscriberInit(String),
}
