//! # Typed Bus Events
//!
//! `BusEvent` is the tagged union of every known payload. The tag is the
//! topic the message travelled on, not a field inside the JSON, so decoding
//! needs both:
//!
//! ```text
//! (topic, JSON) ──→ BusEvent::decode ──→ BusEvent::CustomerOnboarded(..)
//!                        │
//!                        └── unknown topic / wrong shape ──→ DecodeError
//! ```
//!
//! Serializing a `BusEvent` yields the inner payload only, so
//! `client.publish(event.topic(), &event, None)` puts the same JSON on the
//! wire as publishing the payload struct directly.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_bus::{DecodeError, InboundMessage};

use crate::messages::{
    CustomerActivated, CustomerDeactivated, CustomerOnboarded, CustomerProfiled,
    CustomerPromoted, FirstPaymentProcessed, NotificationSent,
};
use crate::topics;

/// Every message shape known to the services.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BusEvent {
    CustomerOnboarded(CustomerOnboarded),
    CustomerActivated(CustomerActivated),
    CustomerDeactivated(CustomerDeactivated),
    FirstPaymentProcessed(FirstPaymentProcessed),
    CustomerPromoted(CustomerPromoted),
    CustomerProfiled(CustomerProfiled),
    NotificationSent(NotificationSent),
}

impl BusEvent {
    /// Decode `payload` using the shape registered for `topic`.
    pub fn decode(topic: &str, payload: &Value) -> Result<Self, DecodeError> {
        fn shape<T: DeserializeOwned>(topic: &str, payload: &Value) -> Result<T, DecodeError> {
            T::deserialize(payload).map_err(|source| DecodeError::Shape {
                topic: topic.to_string(),
                source,
            })
        }

        let event = match topic {
            topics::CUSTOMER_ONBOARDED => Self::CustomerOnboarded(shape(topic, payload)?),
            topics::CUSTOMER_ACTIVATED => Self::CustomerActivated(shape(topic, payload)?),
            topics::CUSTOMER_DEACTIVATED => Self::CustomerDeactivated(shape(topic, payload)?),
            topics::CUSTOMER_FIRST_PAYMENT => {
                Self::FirstPaymentProcessed(shape(topic, payload)?)
            }
            topics::CUSTOMER_PROMOTED => Self::CustomerPromoted(shape(topic, payload)?),
            topics::CUSTOMER_PROFILED => Self::CustomerProfiled(shape(topic, payload)?),
            topics::NOTIFICATION_SENT => Self::NotificationSent(shape(topic, payload)?),
            other => return Err(DecodeError::UnknownTopic(other.to_string())),
        };
        Ok(event)
    }

    /// Decode an inbound bus message.
    pub fn from_message(message: &InboundMessage) -> Result<Self, DecodeError> {
        Self::decode(&message.topic, &message.payload)
    }

    /// Topic this event belongs on.
    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            Self::CustomerOnboarded(_) => topics::CUSTOMER_ONBOARDED,
            Self::CustomerActivated(_) => topics::CUSTOMER_ACTIVATED,
            Self::CustomerDeactivated(_) => topics::CUSTOMER_DEACTIVATED,
            Self::FirstPaymentProcessed(_) => topics::CUSTOMER_FIRST_PAYMENT,
            Self::CustomerPromoted(_) => topics::CUSTOMER_PROMOTED,
            Self::CustomerProfiled(_) => topics::CUSTOMER_PROFILED,
            Self::NotificationSent(_) => topics::NOTIFICATION_SENT,
        }
    }

    /// The customer the event concerns, which is also its partition key.
    #[must_use]
    pub fn customer_id(&self) -> &str {
        match self {
            Self::CustomerOnboarded(e) => &e.customer_id,
            Self::CustomerActivated(e) => &e.customer_id,
            Self::CustomerDeactivated(e) => &e.customer_id,
            Self::FirstPaymentProcessed(e) => &e.customer_id,
            Self::CustomerPromoted(e) => &e.customer_id,
            Self::CustomerProfiled(e) => &e.customer_id,
            Self::NotificationSent(e) => &e.customer_id,
        }
    }
}

macro_rules! impl_from_payload {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for BusEvent {
                fn from(payload: $variant) -> Self {
                    Self::$variant(payload)
                }
            }
        )*
    };
}

impl_from_payload!(
    CustomerOnboarded,
    CustomerActivated,
    CustomerDeactivated,
    FirstPaymentProcessed,
    CustomerPromoted,
    CustomerProfiled,
    NotificationSent,
);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn sent() -> NotificationSent {
        NotificationSent {
            customer_id: "c7".into(),
            channel: "email".into(),
            template: "promotion".into(),
            recipient: "c7@example.com".into(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_decode_by_topic() {
        let payload = serde_json::to_value(sent()).unwrap();
        let event = BusEvent::decode(topics::NOTIFICATION_SENT, &payload).unwrap();

        assert_eq!(event.topic(), topics::NOTIFICATION_SENT);
        assert_eq!(event.customer_id(), "c7");
        assert!(matches!(event, BusEvent::NotificationSent(_)));
    }

    #[test]
    fn test_serializes_inner_payload() {
        let original = sent();
        let event = BusEvent::from(original.clone());

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::to_value(&original).unwrap()
        );
    }

    #[test]
    fn test_unknown_topic_rejected() {
        let err = BusEvent::decode("audit.log", &json!({"customerId": "c1"})).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownTopic(t) if t == "audit.log"));
    }

    #[test]
    fn test_wrong_shape_names_topic() {
        let err = BusEvent::decode(topics::CUSTOMER_ONBOARDED, &json!({"customerId": "c1"}))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Shape { topic, .. } if topic == topics::CUSTOMER_ONBOARDED));
    }

    #[test]
    fn test_every_known_topic_has_a_variant() {
        for topic in topics::ALL {
            let err = BusEvent::decode(topic, &json!({})).unwrap_err();
            assert!(matches!(err, DecodeError::Shape { .. }), "{topic}");
        }
    }
}
