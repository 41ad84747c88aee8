//! # Shared Types Crate
//!
//! Topic names, domain entities and message payloads exchanged by the
//! customer, profiling and notification services.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every payload published on the bus is
//!   defined here, serialized in camelCase.
//! - **Key in Payload**: every message carries `customerId` at the top level;
//!   the bus uses it as the partition key so one customer's events stay
//!   ordered.
//! - **Typed at the Edge**: handlers receive JSON and decode into these
//!   types at the routing boundary (`BusEvent::decode` or
//!   `HandlerBinding::typed`).

pub mod entities;
pub mod event;
pub mod messages;
pub mod topics;
pub mod validation;

pub use entities::*;
pub use event::BusEvent;
pub use messages::*;
pub use validation::ValidationError;
