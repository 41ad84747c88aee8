//! # Profiling Service
//!
//! Reacts to customer lifecycle events with a risk profile and lets operators
//! promote customers by hand.
//!
//! ```text
//! [Event Bus] ──customer.onboarded / customer.activated──→ ProfilingService
//!                                                               │
//!                                   [Event Bus] ←──customer.profiled
//! ```

pub mod bus;
pub mod errors;
pub mod scoring;
pub mod service;

pub use bus::{bindings, contract};
pub use errors::ProfilingError;
pub use service::{ProfilingService, PromoteCustomer, PromotionReceipt};

use shared_bus::BusConfig;

pub const CLIENT_ID: &str = "service-profiling";
pub const GROUP_ID: &str = "profiling-group";

#[must_use]
pub fn bus_config() -> BusConfig {
    BusConfig::from_env(CLIENT_ID, GROUP_ID).with_topics(contract())
}
