//! Logging configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

pub const SERVICE_NAME_ENV: &str = "BUS_SERVICE_NAME";
pub const LOG_LEVEL_ENV: &str = "BUS_LOG_LEVEL";
pub const JSON_LOGS_ENV: &str = "BUS_JSON_LOGS";
pub const CONSOLE_OUTPUT_ENV: &str = "BUS_CONSOLE_OUTPUT";

/// Configuration for the process-wide log subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name stamped on startup logs
    pub service_name: String,

    /// Fallback filter directive when `RUST_LOG` is unset
    pub log_level: String,

    /// Whether to write to stdout at all
    pub console_output: bool,

    /// JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "customer-event-mesh".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BUS_SERVICE_NAME`: Service name (default: customer-event-mesh)
    /// - `BUS_LOG_LEVEL`: Filter used when `RUST_LOG` is unset (default: info)
    /// - `BUS_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `BUS_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            service_name: lookup(SERVICE_NAME_ENV).unwrap_or(defaults.service_name),

            log_level: lookup(LOG_LEVEL_ENV)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_level),

            console_output: lookup(CONSOLE_OUTPUT_ENV)
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: lookup(JSON_LOGS_ENV)
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),
        }
    }

    /// Override the service name.
    #[must_use]
    pub fn for_service(mut self, service_name: &str) -> Self {
        self.service_name = service_name.to_string();
        self
    }
}
