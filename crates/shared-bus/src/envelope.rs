//! # Message Envelope
//!
//! Wire-level wrapper around every published payload, and the shapes the
//! transport hands back on the inbound side.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DecodeError;

/// Payload field used as the partition key when present.
pub const KEY_FIELD: &str = "customerId";

/// Outbound record: partition key, JSON bytes, send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub key: String,
    pub payload: Vec<u8>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Envelope {
    /// Encode `payload` as JSON, stamping it with the current time.
    ///
    /// When `key` is `None` or empty it is derived with [`derive_key`].
    pub fn encode(payload: &Value, key: Option<&str>) -> Result<Self, serde_json::Error> {
        let key = key
            .filter(|k| !k.is_empty())
            .map_or_else(|| derive_key(payload), ToString::to_string);
        Ok(Self {
            key,
            payload: serde_json::to_vec(payload)?,
            timestamp: now_millis(),
        })
    }
}

/// Where the broker stored a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMetadata {
    pub partition: u32,
    pub offset: u64,
}

/// A record as delivered by the consumer transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub key: Option<String>,
    /// `None` or empty when the producer sent no body.
    pub value: Option<Vec<u8>>,
    pub timestamp: i64,
}

impl RawMessage {
    /// Whether the record carries no body at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map_or(true, Vec::is_empty)
    }
}

/// A decoded inbound message handed to a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub topic: String,
    pub key: Option<String>,
    pub partition: u32,
    pub offset: u64,
    pub timestamp: i64,
    pub payload: Value,
}

impl InboundMessage {
    /// Parse a raw record body as JSON.
    pub fn from_raw(raw: RawMessage) -> Result<Self, DecodeError> {
        let bytes = raw.value.unwrap_or_default();
        let payload = serde_json::from_slice(&bytes).map_err(DecodeError::InvalidJson)?;
        Ok(Self {
            topic: raw.topic,
            key: raw.key,
            partition: raw.partition,
            offset: raw.offset,
            timestamp: raw.timestamp,
            payload,
        })
    }

    /// Decode the payload into a concrete message shape.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        T::deserialize(&self.payload).map_err(|source| DecodeError::Shape {
            topic: self.topic.clone(),
            source,
        })
    }
}

/// Partition key for a payload.
///
/// Uses the payload's `customerId` when it is a non-empty string or a number,
/// otherwise the current time in milliseconds. The fallback is only an
/// ordering hint: two keyless messages in the same millisecond share a key.
pub fn derive_key(payload: &Value) -> String {
    match payload.get(KEY_FIELD) {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => now_millis().to_string(),
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
