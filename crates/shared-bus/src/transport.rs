//! # Broker Transport Ports
//!
//! The minimal publish/subscribe contract the bus client needs from a broker.
//! Partition assignment, wire format and group rebalancing stay behind these
//! traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::BusConfig;
use crate::envelope::{Envelope, RawMessage, RecordMetadata};
use crate::errors::TransportError;

/// Outbound channel to the broker.
///
/// Safe to share between any number of concurrent publishers.
#[async_trait]
pub trait Producer: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Send one record and wait for the broker's acknowledgement.
    async fn send(&self, topic: &str, envelope: Envelope) -> Result<RecordMetadata, TransportError>;
}

/// Inbound channel bound to one consumer group.
#[async_trait]
pub trait Consumer: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Add `topic` to the set of consumed topics.
    async fn subscribe(&self, topic: &str, from_beginning: bool) -> Result<(), TransportError>;

    /// Wait for the next record on any subscribed topic.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` - the next record
    /// - `Ok(None)` - the consumer was disconnected; no more records will arrive
    async fn next_message(&self) -> Result<Option<RawMessage>, TransportError>;
}

/// Factory for the two broker handles a client owns.
pub trait Transport: Send + Sync {
    fn producer(&self, config: &BusConfig) -> Arc<dyn Producer>;

    fn consumer(&self, config: &BusConfig) -> Arc<dyn Consumer>;
}
