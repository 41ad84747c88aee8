//! # Bus Client Configuration
//!
//! Construction-time settings for one `BrokerClient`.
//!
//! All timeouts have defaults matching the broker client tuning used by the
//! services; callers override only what they need.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::contract::{ContractEnforcement, TopicContract};

/// Environment variable holding a comma-separated broker list.
pub const BROKERS_ENV: &str = "KAFKA_BROKERS";

/// Broker address used when nothing is configured.
pub const DEFAULT_BROKER: &str = "localhost:9092";

/// Complete bus client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusConfig {
    /// Client identifier reported to the broker.
    pub client_id: String,
    /// Consumer group the inbound channel joins.
    pub group_id: String,
    /// Broker addresses.
    #[serde(default = "default_brokers")]
    pub brokers: Vec<String>,
    /// Emit/consume allow-lists.
    #[serde(default)]
    pub topics: TopicContract,
    /// Transport timeouts and limits.
    #[serde(default)]
    pub tuning: TuningConfig,
    /// How inbound messages are dispatched to handlers.
    #[serde(default)]
    pub dispatch: DispatchMode,
    /// How contract violations are treated.
    #[serde(default)]
    pub enforcement: ContractEnforcement,
}

impl BusConfig {
    /// Configuration with defaults for everything but the identifiers.
    pub fn new(client_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            group_id: group_id.into(),
            brokers: default_brokers(),
            topics: TopicContract::unrestricted(),
            tuning: TuningConfig::default(),
            dispatch: DispatchMode::default(),
            enforcement: ContractEnforcement::default(),
        }
    }

    /// Configuration with brokers read from `KAFKA_BROKERS`.
    ///
    /// Falls back to `localhost:9092` when the variable is unset or blank.
    pub fn from_env(client_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        let mut config = Self::new(client_id, group_id);
        if let Ok(raw) = env::var(BROKERS_ENV) {
            let brokers = parse_brokers(&raw);
            if !brokers.is_empty() {
                config.brokers = brokers;
            }
        }
        config
    }

    /// Replace the topic contract.
    #[must_use]
    pub fn with_topics(mut self, topics: TopicContract) -> Self {
        self.topics = topics;
        self
    }

    /// Replace the broker list.
    #[must_use]
    pub fn with_brokers<I, S>(mut self, brokers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brokers = brokers.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the dispatch mode.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Replace the enforcement policy.
    #[must_use]
    pub fn with_enforcement(mut self, enforcement: ContractEnforcement) -> Self {
        self.enforcement = enforcement;
        self
    }

    /// Broker list joined for log lines and error messages.
    #[must_use]
    pub fn brokers_display(&self) -> String {
        self.brokers.join(",")
    }
}

/// Split a comma-separated broker list, dropping blanks.
pub fn parse_brokers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn default_brokers() -> Vec<String> {
    vec![DEFAULT_BROKER.to_string()]
}

/// Transport timeouts and limits, in milliseconds unless noted.
///
/// These are handed to the transport; the client itself wraps no call in a
/// timeout except the wait for its consumption loop on `stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TuningConfig {
    pub connection_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub session_timeout_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub rebalance_timeout_ms: u64,
    /// Upper bound on bytes fetched per partition.
    pub max_bytes_per_partition: usize,
    /// First retry delay for transient transport errors.
    pub initial_retry_ms: u64,
    /// Retries the transport attempts before surfacing an error.
    pub retries: u32,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            connection_timeout_ms: 3_000,
            request_timeout_ms: 30_000,
            session_timeout_ms: 30_000,
            heartbeat_interval_ms: 3_000,
            rebalance_timeout_ms: 60_000,
            max_bytes_per_partition: 1_048_576, // 1 MiB
            initial_retry_ms: 100,
            retries: 8,
        }
    }
}

impl TuningConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    pub fn initial_retry(&self) -> Duration {
        Duration::from_millis(self.initial_retry_ms)
    }
}

/// How the consumption loop hands messages to handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum DispatchMode {
    /// One loop invokes every handler in turn. A slow handler delays all topics.
    #[default]
    Shared,
    /// The loop only demultiplexes; each topic is drained by its own worker
    /// through a bounded queue. Per-topic order is preserved.
    #[serde(rename_all = "camelCase")]
    PerTopic { queue_capacity: usize },
}
