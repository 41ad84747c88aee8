//! # Bus Errors
//!
//! Error taxonomy for the bus client.
//!
//! | Error | Scope | Policy |
//! |-------|-------|--------|
//! | `ConnectionError` | whole client | fatal at start-up, propagated |
//! | `PublishError` | one publish call | propagated, never retried here |
//! | `SubscribeError` | one subscription call | propagated |
//! | `DecodeError` / `HandlerError` | one inbound message | logged and absorbed by the loop |
//! | `ContractViolation` | one topic | warning, or error under strict enforcement |

use thiserror::Error;

use crate::contract::ContractViolation;

/// Failures reported by the underlying broker transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No broker answered at the configured addresses.
    #[error("Broker unreachable at {brokers}")]
    Unreachable { brokers: String },

    /// The handle was used before `connect` or after `disconnect`.
    #[error("{handle} is not connected")]
    NotConnected { handle: &'static str },

    /// The broker refused the topic.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
}

/// Start-up failure: one or both channels could not connect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Failed to connect producer: {0}")]
    Producer(TransportError),

    #[error("Failed to connect consumer: {0}")]
    Consumer(TransportError),

    #[error("Failed to connect producer ({producer}) and consumer ({consumer})")]
    Both {
        producer: TransportError,
        consumer: TransportError,
    },
}

impl ConnectionError {
    /// Whether the producer side is among the failures.
    #[must_use]
    pub fn producer_failed(&self) -> bool {
        matches!(self, Self::Producer(_) | Self::Both { .. })
    }

    /// Whether the consumer side is among the failures.
    #[must_use]
    pub fn consumer_failed(&self) -> bool {
        matches!(self, Self::Consumer(_) | Self::Both { .. })
    }
}

/// Failure to publish a single message.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The payload could not be encoded as JSON.
    #[error("Failed to serialize payload for topic '{topic}': {source}")]
    Serialize {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    /// The broker rejected or never acknowledged the send.
    #[error("Failed to publish to topic '{topic}': {source}")]
    Transport {
        topic: String,
        #[source]
        source: TransportError,
    },

    /// Topic outside the emit allow-list under strict enforcement.
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

/// Failure to register subscriptions.
#[derive(Debug, Error)]
pub enum SubscribeError {
    /// `subscribe_many` was called with no bindings.
    #[error("No handler bindings supplied")]
    NoBindings,

    /// The consumer could not subscribe to a topic.
    #[error("Failed to subscribe to topic '{topic}': {source}")]
    Transport {
        topic: String,
        #[source]
        source: TransportError,
    },

    /// Topic outside the consume allow-list under strict enforcement.
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

/// An inbound payload could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Message body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Payload does not match expected shape for topic '{topic}': {source}")]
    Shape {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No known message shape for topic '{0}'")]
    UnknownTopic(String),
}

/// A handler reported failure for one message.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Wrap any displayable failure.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self::Failed(reason.to_string())
    }
}
