//! # Shared Bus - Event Bus Client for Services
//!
//! Every service embeds one `BrokerClient`. It is the only component holding
//! live broker handles.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐                                   ┌──────────────┐
//! │  Service A   │  publish(topic, payload)          │  Service B   │
//! │ BrokerClient │ ──────┐                           │ BrokerClient │
//! └──────────────┘       │                           └──────────────┘
//!                        ▼                                   ↑
//!                  ┌──────────────┐   consumption loop       │
//!                  │    Broker    │ ─────────────────────────┘
//!                  └──────────────┘   routes by topic to handlers
//! ```
//!
//! ## Guarantees
//!
//! - **Topic contract:** every publish and subscription is checked against the
//!   service's allow-lists (advisory by default)
//! - **One loop:** all consumed topics share a single consumption loop per client
//! - **Failure isolation:** a poisoned message is logged and skipped; it never
//!   stops the loop
//! - **Fail-fast start:** `start()` fails if either side cannot connect

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod client;
pub mod config;
pub mod contract;
pub mod dispatch;
pub mod envelope;
pub mod errors;
pub mod handler;
pub mod memory;
pub mod transport;

// Re-export main types
pub use client::{BrokerClient, ClientDiagnostics};
pub use config::{BusConfig, DispatchMode, TuningConfig, BROKERS_ENV, DEFAULT_BROKER};
pub use contract::{ContractDirection, ContractEnforcement, ContractViolation, TopicContract};
pub use dispatch::{Delivery, Router};
pub use envelope::{derive_key, now_millis, Envelope, InboundMessage, RawMessage, RecordMetadata};
pub use errors::{
    ConnectionError, DecodeError, HandlerError, PublishError, SubscribeError, TransportError,
};
pub use handler::{handler_fn, HandlerBinding, MessageHandler};
pub use memory::InMemoryBroker;
pub use transport::{Consumer, Producer, Transport};
