//! # Customer Commands
//!
//! Request bodies accepted by the customer façade, with their validation
//! rules. Field names follow the JSON wire format (camelCase).

use serde::{Deserialize, Serialize};
use shared_types::validation::{optional_date, require, require_email, require_positive};
use shared_types::ValidationError;

/// Register a new customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    /// ISO 8601 date.
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl OnboardCustomer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require_email("email", &self.email)?;
        require("phone", &self.phone)?;
        optional_date("birthDate", self.birth_date.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateCustomer {
    pub customer_id: String,
    pub activation_reason: String,
}

impl ActivateCustomer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("customerId", &self.customer_id)?;
        require("activationReason", &self.activation_reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateCustomer {
    pub customer_id: String,
    pub deactivation_reason: String,
}

impl DeactivateCustomer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("customerId", &self.customer_id)?;
        require("deactivationReason", &self.deactivation_reason)
    }
}

/// Record a customer's first payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstPayment {
    pub customer_id: String,
    pub amount: f64,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl FirstPayment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("customerId", &self.customer_id)?;
        require_positive("amount", self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteCustomer {
    pub customer_id: String,
}

impl PromoteCustomer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("customerId", &self.customer_id)
    }
}

/// Successful command outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandReceipt {
    pub customer_id: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn onboard() -> OnboardCustomer {
        OnboardCustomer {
            name: "Ana Torres".into(),
            email: "ana@example.com".into(),
            phone: "+34600111222".into(),
            ..OnboardCustomer::default()
        }
    }

    #[test]
    fn test_onboard_minimal_is_valid() {
        assert!(onboard().validate().is_ok());
    }

    #[test]
    fn test_onboard_rejects_each_required_field() {
        let cases: [(&str, fn(&mut OnboardCustomer)); 3] = [
            ("name", |c| c.name.clear()),
            ("email", |c| c.email = "not-an-email".into()),
            ("phone", |c| c.phone = " ".into()),
        ];

        for (field, mutate) in cases {
            let mut command = onboard();
            mutate(&mut command);
            assert_eq!(command.validate().unwrap_err().field, field);
        }
    }

    #[test]
    fn test_onboard_rejects_bad_birth_date() {
        let command = OnboardCustomer {
            birth_date: Some("31/12/1990".into()),
            ..onboard()
        };
        assert_eq!(command.validate().unwrap_err().field, "birthDate");
    }

    #[test]
    fn test_onboard_from_json() {
        let command: OnboardCustomer = serde_json::from_value(json!({
            "name": "Ana",
            "email": "ana@example.com",
            "phone": "1",
            "documentType": "DNI",
            "birthDate": "1990-12-31"
        }))
        .unwrap();

        assert_eq!(command.document_type.as_deref(), Some("DNI"));
        assert!(command.validate().is_ok());
    }

    #[test]
    fn test_reasons_required() {
        let activate = ActivateCustomer {
            customer_id: "c1".into(),
            activation_reason: String::new(),
        };
        assert_eq!(activate.validate().unwrap_err().field, "activationReason");

        let deactivate = DeactivateCustomer {
            customer_id: String::new(),
            deactivation_reason: "fraud".into(),
        };
        assert_eq!(deactivate.validate().unwrap_err().field, "customerId");
    }

    #[test]
    fn test_first_payment_amount_positive() {
        let payment = FirstPayment {
            customer_id: "c1".into(),
            amount: 0.0,
            payment_method: None,
            description: None,
        };
        assert_eq!(payment.validate().unwrap_err().field, "amount");
    }
}
