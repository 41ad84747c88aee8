//! # Bus Message Payloads
//!
//! One struct per topic. Every payload carries `customerId` at the top level
//! so the bus derives the partition key from it.
//!
//! | Topic | Payload | Producer |
//! |-------|---------|----------|
//! | `customer.onboarded` | `CustomerOnboarded` | customer |
//! | `customer.activated` | `CustomerActivated` | customer |
//! | `customer.deactivated` | `CustomerDeactivated` | customer |
//! | `customer.first_payment` | `FirstPaymentProcessed` | customer |
//! | `customer.promoted` | `CustomerPromoted` | customer |
//! | `customer.profiled` | `CustomerProfiled` | profiling |
//! | `notification.sent` | `NotificationSent` | notifications |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Customer, Payment, Profile, Promotion};

/// A customer completed onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOnboarded {
    pub customer_id: String,
    pub customer: Customer,
    pub timestamp: DateTime<Utc>,
}

/// A customer was activated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerActivated {
    pub customer_id: String,
    pub customer: Customer,
    pub timestamp: DateTime<Utc>,
}

/// A customer was deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDeactivated {
    pub customer_id: String,
    pub customer: Customer,
    pub timestamp: DateTime<Utc>,
}

/// A customer's first payment went through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstPaymentProcessed {
    pub customer_id: String,
    pub payment: Payment,
    pub customer: Customer,
    pub timestamp: DateTime<Utc>,
}

/// A customer moved to the premium tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPromoted {
    pub customer_id: String,
    pub customer: Customer,
    pub timestamp: DateTime<Utc>,
}

/// Profiling output: either a computed profile or a manual promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfiled {
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<Promotion>,
    pub timestamp: DateTime<Utc>,
}

/// A notification was delivered to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSent {
    pub customer_id: String,
    /// Delivery channel, e.g. `email`.
    #[serde(rename = "type")]
    pub channel: String,
    pub template: String,
    pub recipient: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_channel_serialized_as_type() {
        let sent = NotificationSent {
            customer_id: "c1".into(),
            channel: "email".into(),
            template: "welcome".into(),
            recipient: "ana@example.com".into(),
            timestamp: Utc::now(),
        };

        let value = serde_json::to_value(&sent).unwrap();
        assert_eq!(value["type"], "email");
        assert_eq!(value["customerId"], "c1");
        assert!(value.get("channel").is_none());
    }

    #[test]
    fn test_profiled_with_promotion_only() {
        let profiled: CustomerProfiled = serde_json::from_value(json!({
            "customerId": "c1",
            "promotion": {
                "customerId": "c1",
                "newTier": "vip",
                "reason": "loyalty",
                "promotedAt": "2024-05-01T10:00:00Z"
            },
            "timestamp": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert!(profiled.profile.is_none());
        assert_eq!(profiled.promotion.unwrap().new_tier, "vip");
    }
}
