//! # Customer Event Mesh Runtime
//!
//! Hosts the customer, profiling and notification services in one process.
//! Services never call each other; everything flows through the bus.
//!
//! ```text
//! customer ──customer.onboarded──→ profiling ──customer.profiled──→ (audit)
//!    │                    └──────→ notifications ──notification.sent──→ customer
//!    ├──customer.activated──→ profiling, notifications
//!    └──customer.promoted───→ notifications
//! ```
//!
//! ## Modular Structure
//!
//! - `config` - Bus-wide settings from the environment
//! - `runtime` - Client wiring, startup and shutdown
//! - `demo` - Optional scripted lifecycle

pub mod config;
pub mod demo;
pub mod runtime;

pub use config::{ConfigError, RuntimeConfig};
pub use demo::run_demo;
pub use runtime::ServiceRuntime;
