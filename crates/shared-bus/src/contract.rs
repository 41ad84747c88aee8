//! # Topic Contract
//!
//! Declares which topics a service may emit and which it may consume.
//!
//! The contract is immutable once built. `None` for either side means the
//! service declared no list, so every topic passes; an empty list forbids
//! every topic.
//!
//! Violations are advisory by default: they are logged and the operation
//! proceeds. `ContractEnforcement::Strict` turns them into errors.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Direction of a topic use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractDirection {
    Emit,
    Consume,
}

impl fmt::Display for ContractDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emit => write!(f, "emit"),
            Self::Consume => write!(f, "consume"),
        }
    }
}

/// A topic used outside the declared allow-list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Topic '{topic}' is not in the {direction} allow-list")]
pub struct ContractViolation {
    pub direction: ContractDirection,
    pub topic: String,
}

/// How contract violations are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractEnforcement {
    /// Log a warning and carry on.
    #[default]
    Advisory,
    /// Reject the operation with `ContractViolation`.
    Strict,
}

/// Per-service declaration of emitted and consumed topics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicContract {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    emit: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    consume: Option<BTreeSet<String>>,
}

impl TopicContract {
    /// A contract with no allow-lists; every topic passes.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Build a contract from explicit emit and consume lists.
    pub fn new<E, C, S1, S2>(emit: E, consume: C) -> Self
    where
        E: IntoIterator<Item = S1>,
        C: IntoIterator<Item = S2>,
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            emit: Some(emit.into_iter().map(Into::into).collect()),
            consume: Some(consume.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether `topic` may be published.
    #[must_use]
    pub fn can_emit(&self, topic: &str) -> bool {
        self.emit.as_ref().map_or(true, |allowed| allowed.contains(topic))
    }

    /// Whether `topic` may be subscribed to.
    #[must_use]
    pub fn can_consume(&self, topic: &str) -> bool {
        self.consume
            .as_ref()
            .map_or(true, |allowed| allowed.contains(topic))
    }

    /// Declared emit list, if any.
    #[must_use]
    pub fn emit_topics(&self) -> Option<&BTreeSet<String>> {
        self.emit.as_ref()
    }

    /// Declared consume list, if any.
    #[must_use]
    pub fn consume_topics(&self) -> Option<&BTreeSet<String>> {
        self.consume.as_ref()
    }

    /// Check `topic` for `direction`, warning or failing per `enforcement`.
    pub fn check(
        &self,
        direction: ContractDirection,
        topic: &str,
        enforcement: ContractEnforcement,
    ) -> Result<(), ContractViolation> {
        let allowed = match direction {
            ContractDirection::Emit => self.can_emit(topic),
            ContractDirection::Consume => self.can_consume(topic),
        };
        if allowed {
            return Ok(());
        }

        let violation = ContractViolation {
            direction,
            topic: topic.to_string(),
        };
        match enforcement {
            ContractEnforcement::Advisory => {
                warn!(topic = %topic, direction = %direction, "Topic not in allow-list");
                Ok(())
            }
            ContractEnforcement::Strict => Err(violation),
        }
    }
}
