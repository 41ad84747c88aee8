//! # Runtime Configuration
//!
//! Bus-wide settings applied on top of each service's own `BusConfig`.
//!
//! | Variable | Default | Values |
//! |----------|---------|--------|
//! | `BUS_DISPATCH` | `shared` | `shared`, `per-topic` |
//! | `BUS_QUEUE_CAPACITY` | `64` | per-topic queue bound |
//! | `BUS_CONTRACT` | `advisory` | `advisory`, `strict` |
//! | `BUS_PARTITIONS` | `1` | partitions per topic |
//! | `BUS_RETENTION` | `10000` | records kept per partition |
//! | `BUS_DEMO` | unset | `1`/`true` runs the demo flow |

use std::env;

use shared_bus::memory::DEFAULT_RETENTION;
use shared_bus::{BusConfig, ContractEnforcement, DispatchMode};
use thiserror::Error;

pub const DISPATCH_ENV: &str = "BUS_DISPATCH";
pub const QUEUE_CAPACITY_ENV: &str = "BUS_QUEUE_CAPACITY";
pub const CONTRACT_ENV: &str = "BUS_CONTRACT";
pub const PARTITIONS_ENV: &str = "BUS_PARTITIONS";
pub const RETENTION_ENV: &str = "BUS_RETENTION";
pub const DEMO_ENV: &str = "BUS_DEMO";

const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}: expected {expected}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub dispatch: DispatchMode,
    pub enforcement: ContractEnforcement,
    pub partitions: u32,
    /// Records the in-memory broker keeps per partition.
    pub retention: usize,
    pub demo: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchMode::Shared,
            enforcement: ContractEnforcement::Advisory,
            partitions: 1,
            retention: DEFAULT_RETENTION,
            demo: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let queue_capacity = match lookup(QUEUE_CAPACITY_ENV) {
            None => DEFAULT_QUEUE_CAPACITY,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    var: QUEUE_CAPACITY_ENV,
                    value: raw,
                    expected: "a positive integer",
                })?,
        };

        let dispatch = match lookup(DISPATCH_ENV).as_deref().map(str::trim) {
            None | Some("shared") => DispatchMode::Shared,
            Some("per-topic") => DispatchMode::PerTopic { queue_capacity },
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: DISPATCH_ENV,
                    value: other.to_string(),
                    expected: "shared or per-topic",
                })
            }
        };

        let enforcement = match lookup(CONTRACT_ENV).as_deref().map(str::trim) {
            None | Some("advisory") => ContractEnforcement::Advisory,
            Some("strict") => ContractEnforcement::Strict,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: CONTRACT_ENV,
                    value: other.to_string(),
                    expected: "advisory or strict",
                })
            }
        };

        let partitions = match lookup(PARTITIONS_ENV) {
            None => 1,
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    var: PARTITIONS_ENV,
                    value: raw,
                    expected: "a positive integer",
                })?,
        };

        let retention = match lookup(RETENTION_ENV) {
            None => DEFAULT_RETENTION,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    var: RETENTION_ENV,
                    value: raw,
                    expected: "a positive integer",
                })?,
        };

        let demo = lookup(DEMO_ENV)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            dispatch,
            enforcement,
            partitions,
            retention,
            demo,
        })
    }

    /// Apply the bus-wide settings to a service's configuration.
    #[must_use]
    pub fn apply(&self, config: BusConfig) -> BusConfig {
        config
            .with_dispatch(self.dispatch)
            .with_enforcement(self.enforcement)
    }
}
