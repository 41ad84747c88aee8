//! # Notification Service
//!
//! Sends one email per customer event it consumes, then announces the
//! delivery on `notification.sent`. Delivery is simulated with a fixed delay.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_bus::{BrokerClient, HandlerError};
use shared_types::validation::{require, require_email, require_object};
use shared_types::{topics, Customer, NotificationSent, ValidationError};
use tracing::info;
use uuid::Uuid;

use crate::errors::NotificationError;
use crate::templates::{recipient, Template};

/// Simulated delivery latency per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverySettings {
    pub email_delay: Duration,
    pub sms_delay: Duration,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            email_delay: Duration::from_millis(100),
            sms_delay: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmail {
    #[serde(default)]
    pub customer_id: Option<String>,
    pub to: String,
    pub subject: String,
    pub template: String,
    pub data: Value,
}

impl SendEmail {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_email("to", &self.to)?;
        require("subject", &self.subject)?;
        require("template", &self.template)?;
        require_object("data", &self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSms {
    pub customer_id: String,
    pub phone: String,
    pub template: String,
    pub data: Value,
}

impl SendSms {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("customerId", &self.customer_id)?;
        require("phone", &self.phone)?;
        require("template", &self.template)?;
        require_object("data", &self.data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

/// Outcome of a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub channel: Channel,
    pub recipient: String,
    pub template: String,
    pub sent_at: DateTime<Utc>,
}

pub struct NotificationService {
    bus: Arc<BrokerClient>,
    settings: DeliverySettings,
    delivered: Mutex<Vec<DeliveryReceipt>>,
}

impl NotificationService {
    pub fn new(bus: Arc<BrokerClient>) -> Arc<Self> {
        Self::with_settings(bus, DeliverySettings::default())
    }

    pub fn with_settings(bus: Arc<BrokerClient>, settings: DeliverySettings) -> Arc<Self> {
        Arc::new(Self {
            bus,
            settings,
            delivered: Mutex::new(Vec::new()),
        })
    }

    pub async fn send_email(&self, command: SendEmail) -> Result<DeliveryReceipt, NotificationError> {
        command.validate()?;
        info!(to = %command.to, template = %command.template, "Sending email");

        tokio::time::sleep(self.settings.email_delay).await;

        let receipt = self.record(Channel::Email, command.to, command.template);
        info!(to = %receipt.recipient, message_id = %receipt.message_id, "Email sent");
        Ok(receipt)
    }

    pub async fn send_sms(&self, command: SendSms) -> Result<DeliveryReceipt, NotificationError> {
        command.validate()?;
        info!(phone = %command.phone, template = %command.template, "Sending SMS");

        tokio::time::sleep(self.settings.sms_delay).await;

        let receipt = self.record(Channel::Sms, command.phone, command.template);
        info!(to = %receipt.recipient, message_id = %receipt.message_id, "SMS sent");
        Ok(receipt)
    }

    /// Every message delivered so far, oldest first.
    #[must_use]
    pub fn delivered(&self) -> Vec<DeliveryReceipt> {
        self.delivered.lock().clone()
    }

    /// Email the customer with `template` and publish `notification.sent`.
    pub(crate) async fn notify(
        &self,
        template: Template,
        customer_id: &str,
        customer: &Customer,
    ) -> Result<(), HandlerError> {
        let to = recipient(customer).to_string();
        info!(customer_id = %customer_id, template = template.as_str(), to = %to, "Notifying customer");

        let receipt = self
            .send_email(SendEmail {
                customer_id: Some(customer_id.to_string()),
                to,
                subject: template.subject().to_string(),
                template: template.as_str().to_string(),
                data: template.data(customer),
            })
            .await?;

        let event = NotificationSent {
            customer_id: customer_id.to_string(),
            channel: receipt.channel.as_str().to_string(),
            template: receipt.template,
            recipient: receipt.recipient,
            timestamp: Utc::now(),
        };
        self.bus.publish(topics::NOTIFICATION_SENT, &event, None).await?;
        Ok(())
    }

    fn record(&self, channel: Channel, recipient: String, template: String) -> DeliveryReceipt {
        let receipt = DeliveryReceipt {
            message_id: format!("{}_{}", channel.as_str(), Uuid::new_v4()),
            channel,
            recipient,
            template,
            sent_at: Utc::now(),
        };
        self.delivered.lock().push(receipt.clone());
        receipt
    }
}
