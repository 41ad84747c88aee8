//! # Domain Entities
//!
//! Records embedded in bus messages.
//!
//! ## Clusters
//!
//! - **Customer**: `Customer`, `CustomerStatus`
//! - **Billing**: `Payment`
//! - **Profiling**: `Profile`, `Segment`, `Promotion`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// CLUSTER A: CUSTOMER
// =============================================================================

/// Lifecycle state of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Onboarded,
    Active,
    Inactive,
    Premium,
}

impl CustomerStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onboarded => "onboarded",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Premium => "premium",
        }
    }
}

/// A customer as held by the customer service and copied into its events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub status: CustomerStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub has_first_payment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<DateTime<Utc>>,
}

// =============================================================================
// CLUSTER B: BILLING
// =============================================================================

/// A processed payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub customer_id: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub processed_at: DateTime<Utc>,
}

// =============================================================================
// CLUSTER C: PROFILING
// =============================================================================

/// Marketing segment assigned by profiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Basic,
    Premium,
    Vip,
    /// Assigned on activation, replacing the onboarding segment.
    Active,
}

/// Risk profile computed for a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub customer_id: String,
    /// 0..=99
    pub risk_score: u8,
    pub segment: Segment,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// A manual tier change decided by profiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub customer_id: String,
    pub new_tier: String,
    pub reason: String,
    pub promoted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_customer_wire_names() {
        let customer = Customer {
            id: "1700000000000".into(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: "+34600000000".into(),
            document_type: Some("DNI".into()),
            document_number: None,
            birth_date: None,
            address: None,
            city: None,
            country: None,
            status: CustomerStatus::Onboarded,
            created_at: Utc::now(),
            activated_at: None,
            deactivated_at: None,
            first_payment_at: None,
            has_first_payment: false,
            promoted_at: None,
        };

        let value = serde_json::to_value(&customer).unwrap();
        assert_eq!(value["status"], "onboarded");
        assert_eq!(value["documentType"], "DNI");
        assert!(value.get("documentNumber").is_none());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_profile_accepts_missing_optionals() {
        let profile: Profile = serde_json::from_value(json!({
            "customerId": "c1",
            "riskScore": 42,
            "segment": "active",
            "lastUpdated": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(profile.segment, Segment::Active);
        assert!(profile.recommendations.is_empty());
        assert!(profile.created_at.is_none());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(CustomerStatus::Premium.as_str(), "premium");
        assert_eq!(
            serde_json::to_value(CustomerStatus::Inactive).unwrap(),
            json!("inactive")
        );
    }
}
