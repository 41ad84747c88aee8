//! # Customer Service
//!
//! Holds customers in memory and publishes one event per state change.
//!
//! ```text
//! onboard ──────→ customer.onboarded
//! activate ─────→ customer.activated
//! deactivate ───→ customer.deactivated
//! first_payment → customer.first_payment
//! promote ──────→ customer.promoted
//! ```
//!
//! State is updated before publishing. A publish failure is returned to the
//! caller but the state change is kept.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_bus::{now_millis, BrokerClient, ClientDiagnostics};
use shared_types::{
    BusEvent, Customer, CustomerActivated, CustomerDeactivated, CustomerOnboarded,
    CustomerPromoted, CustomerStatus, FirstPaymentProcessed, NotificationSent, Payment,
};
use tracing::info;

use crate::commands::{
    ActivateCustomer, CommandReceipt, DeactivateCustomer, FirstPayment, OnboardCustomer,
    PromoteCustomer,
};
use crate::errors::CustomerError;
use crate::CLIENT_ID;

/// Liveness report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub customers: usize,
    pub bus: ClientDiagnostics,
}

pub struct CustomerService {
    bus: Arc<BrokerClient>,
    customers: RwLock<HashMap<String, Customer>>,
    notifications_seen: AtomicU64,
}

impl CustomerService {
    pub fn new(bus: Arc<BrokerClient>) -> Arc<Self> {
        Arc::new(Self {
            bus,
            customers: RwLock::new(HashMap::new()),
            notifications_seen: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn bus(&self) -> &Arc<BrokerClient> {
        &self.bus
    }

    /// Register a customer. The id is the creation time in milliseconds.
    pub async fn onboard(&self, command: OnboardCustomer) -> Result<CommandReceipt, CustomerError> {
        command.validate()?;
        info!(email = %command.email, "Onboarding customer");

        let now = Utc::now();
        let customer = {
            let mut customers = self.customers.write();
            let mut id = now_millis();
            while customers.contains_key(&id.to_string()) {
                id += 1;
            }
            let customer = Customer {
                id: id.to_string(),
                name: command.name,
                email: command.email,
                phone: command.phone,
                document_type: command.document_type,
                document_number: command.document_number,
                birth_date: command.birth_date,
                address: command.address,
                city: command.city,
                country: command.country,
                status: CustomerStatus::Onboarded,
                created_at: now,
                activated_at: None,
                deactivated_at: None,
                first_payment_at: None,
                has_first_payment: false,
                promoted_at: None,
            };
            customers.insert(customer.id.clone(), customer.clone());
            customer
        };

        let customer_id = customer.id.clone();
        self.emit(CustomerOnboarded {
            customer_id: customer_id.clone(),
            customer,
            timestamp: now,
        })
        .await?;

        Ok(CommandReceipt {
            customer_id,
            message: "Customer onboarded successfully".to_string(),
        })
    }

    pub async fn activate(&self, command: ActivateCustomer) -> Result<CommandReceipt, CustomerError> {
        command.validate()?;
        info!(
            customer_id = %command.customer_id,
            reason = %command.activation_reason,
            "Activating customer"
        );

        let now = Utc::now();
        let customer = self.update(&command.customer_id, |c| {
            c.status = CustomerStatus::Active;
            c.activated_at = Some(now);
            Ok(())
        })?;

        self.emit(CustomerActivated {
            customer_id: command.customer_id.clone(),
            customer,
            timestamp: now,
        })
        .await?;

        Ok(CommandReceipt {
            customer_id: command.customer_id,
            message: "Customer activated successfully".to_string(),
        })
    }

    pub async fn deactivate(
        &self,
        command: DeactivateCustomer,
    ) -> Result<CommandReceipt, CustomerError> {
        command.validate()?;
        info!(
            customer_id = %command.customer_id,
            reason = %command.deactivation_reason,
            "Deactivating customer"
        );

        let now = Utc::now();
        let customer = self.update(&command.customer_id, |c| {
            c.status = CustomerStatus::Inactive;
            c.deactivated_at = Some(now);
            Ok(())
        })?;

        self.emit(CustomerDeactivated {
            customer_id: command.customer_id.clone(),
            customer,
            timestamp: now,
        })
        .await?;

        Ok(CommandReceipt {
            customer_id: command.customer_id,
            message: "Customer deactivated successfully".to_string(),
        })
    }

    /// Record the first payment. A second call for the same customer fails.
    pub async fn first_payment(&self, command: FirstPayment) -> Result<CommandReceipt, CustomerError> {
        command.validate()?;
        info!(
            customer_id = %command.customer_id,
            amount = command.amount,
            "Processing first payment"
        );

        let now = Utc::now();
        let customer = self.update(&command.customer_id, |c| {
            if c.has_first_payment {
                return Err(CustomerError::FirstPaymentAlreadyRecorded(c.id.clone()));
            }
            c.has_first_payment = true;
            c.first_payment_at = Some(now);
            Ok(())
        })?;

        let payment = Payment {
            customer_id: command.customer_id.clone(),
            amount: command.amount,
            payment_method: command.payment_method,
            description: command.description,
            processed_at: now,
        };
        self.emit(FirstPaymentProcessed {
            customer_id: command.customer_id.clone(),
            payment,
            customer,
            timestamp: now,
        })
        .await?;

        Ok(CommandReceipt {
            customer_id: command.customer_id,
            message: "First payment processed successfully".to_string(),
        })
    }

    pub async fn promote(&self, command: PromoteCustomer) -> Result<CommandReceipt, CustomerError> {
        command.validate()?;
        info!(customer_id = %command.customer_id, "Promoting customer");

        let now = Utc::now();
        let customer = self.update(&command.customer_id, |c| {
            c.status = CustomerStatus::Premium;
            c.promoted_at = Some(now);
            Ok(())
        })?;

        self.emit(CustomerPromoted {
            customer_id: command.customer_id.clone(),
            customer,
            timestamp: now,
        })
        .await?;

        Ok(CommandReceipt {
            customer_id: command.customer_id,
            message: "Customer promoted successfully".to_string(),
        })
    }

    #[must_use]
    pub fn get(&self, customer_id: &str) -> Option<Customer> {
        self.customers.read().get(customer_id).cloned()
    }

    /// All customers, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<Customer> {
        let mut customers: Vec<Customer> = self.customers.read().values().cloned().collect();
        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        customers
    }

    #[must_use]
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok".to_string(),
            service: CLIENT_ID.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            customers: self.customers.read().len(),
            bus: self.bus.get_config(),
        }
    }

    /// Number of `notification.sent` events received.
    #[must_use]
    pub fn notifications_seen(&self) -> u64 {
        self.notifications_seen.load(Ordering::Relaxed)
    }

    pub(crate) fn record_notification(&self, notification: &NotificationSent) {
        self.notifications_seen.fetch_add(1, Ordering::Relaxed);
        info!(
            customer_id = %notification.customer_id,
            channel = %notification.channel,
            template = %notification.template,
            recipient = %notification.recipient,
            "Notification sent to customer"
        );
    }

    /// Apply `change` to a stored customer and return the updated copy.
    fn update<F>(&self, customer_id: &str, change: F) -> Result<Customer, CustomerError>
    where
        F: FnOnce(&mut Customer) -> Result<(), CustomerError>,
    {
        let mut customers = self.customers.write();
        let customer = customers
            .get_mut(customer_id)
            .ok_or_else(|| CustomerError::NotFound(customer_id.to_string()))?;
        change(customer)?;
        Ok(customer.clone())
    }

    async fn emit(&self, event: impl Into<BusEvent>) -> Result<(), CustomerError> {
        let event = event.into();
        self.bus.publish(event.topic(), &event, None).await?;
        Ok(())
    }
}
