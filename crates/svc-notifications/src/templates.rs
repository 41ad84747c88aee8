//! Email templates triggered by customer events.

use serde::{Deserialize, Serialize};
use shared_types::{topics, Customer};

/// Recipient used when the event carries no email.
pub const FALLBACK_RECIPIENT: &str = "customer@example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Template {
    Welcome,
    AccountActivated,
    Promotion,
}

impl Template {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::AccountActivated => "account-activated",
            Self::Promotion => "promotion",
        }
    }

    #[must_use]
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Welcome => "Welcome to our platform!",
            Self::AccountActivated => "Your account has been activated",
            Self::Promotion => "Congratulations! You have been promoted",
        }
    }

    /// Template sent for events on `topic`, if any.
    #[must_use]
    pub fn for_topic(topic: &str) -> Option<Self> {
        match topic {
            topics::CUSTOMER_ONBOARDED => Some(Self::Welcome),
            topics::CUSTOMER_ACTIVATED => Some(Self::AccountActivated),
            topics::CUSTOMER_PROMOTED => Some(Self::Promotion),
            _ => None,
        }
    }

    /// Merge data for `customer`.
    #[must_use]
    pub fn data(&self, customer: &Customer) -> serde_json::Value {
        let mut data = serde_json::json!({
            "customerName": customer.name,
            "customerId": customer.id,
        });
        match self {
            Self::Welcome => {}
            Self::AccountActivated => {
                data["activationDate"] = serde_json::to_value(customer.activated_at)
                    .unwrap_or(serde_json::Value::Null);
            }
            Self::Promotion => {
                data["newStatus"] = customer.status.as_str().into();
            }
        }
        data
    }
}

/// Email address to use for `customer`.
#[must_use]
pub fn recipient(customer: &Customer) -> &str {
    if customer.email.trim().is_empty() {
        FALLBACK_RECIPIENT
    } else {
        &customer.email
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared_types::CustomerStatus;

    fn customer(email: &str) -> Customer {
        Customer {
            id: "c1".into(),
            name: "Marta".into(),
            email: email.into(),
            phone: "600".into(),
            document_type: None,
            document_number: None,
            birth_date: None,
            address: None,
            city: None,
            country: None,
            status: CustomerStatus::Premium,
            created_at: Utc::now(),
            activated_at: None,
            deactivated_at: None,
            first_payment_at: None,
            has_first_payment: false,
            promoted_at: None,
        }
    }

    #[test]
    fn test_topic_mapping() {
        assert_eq!(Template::for_topic(topics::CUSTOMER_ONBOARDED), Some(Template::Welcome));
        assert_eq!(
            Template::for_topic(topics::CUSTOMER_ACTIVATED),
            Some(Template::AccountActivated)
        );
        assert_eq!(Template::for_topic(topics::CUSTOMER_PROMOTED), Some(Template::Promotion));
        assert_eq!(Template::for_topic(topics::CUSTOMER_DEACTIVATED), None);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_value(Template::AccountActivated).unwrap(),
            serde_json::json!(Template::AccountActivated.as_str())
        );
    }

    #[test]
    fn test_promotion_data_has_status() {
        let data = Template::Promotion.data(&customer("m@example.com"));
        assert_eq!(data["newStatus"], "premium");
        assert_eq!(data["customerName"], "Marta");
    }

    #[test]
    fn test_recipient_fallback() {
        assert_eq!(recipient(&customer("m@example.com")), "m@example.com");
        assert_eq!(recipient(&customer("")), FALLBACK_RECIPIENT);
    }
}
