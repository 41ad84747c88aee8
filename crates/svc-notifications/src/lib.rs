//! # Notification Service
//!
//! ```text
//! customer.onboarded ──→ welcome email ───────────┐
//! customer.activated ──→ account-activated email ─┼──→ notification.sent
//! customer.promoted ───→ promotion email ─────────┘
//! ```
//!
//! `send_email` and `send_sms` are also callable directly.

pub mod bus;
pub mod errors;
pub mod service;
pub mod templates;

pub use bus::{bindings, contract};
pub use errors::NotificationError;
pub use service::{
    Channel, DeliveryReceipt, DeliverySettings, NotificationService, SendEmail, SendSms,
};
pub use templates::Template;

use shared_bus::BusConfig;

pub const CLIENT_ID: &str = "service-notifications";
pub const GROUP_ID: &str = "notifications-group";

#[must_use]
pub fn bus_config() -> BusConfig {
    BusConfig::from_env(CLIENT_ID, GROUP_ID).with_topics(contract())
}
