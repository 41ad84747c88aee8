//! # Customer Service
//!
//! Owns the customer lifecycle and announces every change on the bus.
//!
//! ```text
//! caller ──→ CustomerService ──publish──→ [Event Bus] ──→ profiling, notifications
//!                  ↑
//!                  └──── notification.sent ──── [Event Bus]
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let bus = Arc::new(BrokerClient::new(svc_customer::bus_config(), &broker));
//! bus.start().await?;
//! let service = CustomerService::new(Arc::clone(&bus));
//! bus.subscribe_many(svc_customer::bindings(&service)).await?;
//! ```

pub mod bus;
pub mod commands;
pub mod errors;
pub mod service;

pub use bus::{bindings, contract};
pub use commands::{
    ActivateCustomer, CommandReceipt, DeactivateCustomer, FirstPayment, OnboardCustomer,
    PromoteCustomer,
};
pub use errors::CustomerError;
pub use service::{CustomerService, HealthReport};

use shared_bus::BusConfig;

pub const CLIENT_ID: &str = "service-customer";
pub const GROUP_ID: &str = "customers-group";

/// Bus configuration from the environment with this service's identity and contract.
#[must_use]
pub fn bus_config() -> BusConfig {
    BusConfig::from_env(CLIENT_ID, GROUP_ID).with_topics(contract())
}
