//! # Service Runtime
//!
//! Wires the three services and an audit tap onto one broker.
//!
//! ```text
//!                    ┌──────────────── InMemoryBroker ────────────────┐
//!                    │                                                │
//! service-customer ──┤  customers-group      profiling-group          ├── service-profiling
//!                    │  notifications-group  audit-group              ├── service-notifications
//!                    └────────────────────────────────────────────────┘── service-audit
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Connect every client concurrently; any failure aborts startup
//! 2. Register each service's handler set (one consumption loop per client)
//! 3. Serve until shutdown, then stop every client best-effort

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use shared_bus::{
    BrokerClient, BusConfig, ClientDiagnostics, HandlerBinding, HandlerError, InMemoryBroker,
    TopicContract,
};
use shared_types::{topics, BusEvent};
use svc_customer::CustomerService;
use svc_notifications::NotificationService;
use svc_profiling::ProfilingService;
use tracing::info;

use crate::config::RuntimeConfig;

pub const AUDIT_CLIENT_ID: &str = "service-audit";
pub const AUDIT_GROUP_ID: &str = "audit-group";

pub struct ServiceRuntime {
    broker: InMemoryBroker,
    customer_bus: Arc<BrokerClient>,
    profiling_bus: Arc<BrokerClient>,
    notifications_bus: Arc<BrokerClient>,
    audit_bus: Arc<BrokerClient>,
    audited: Arc<AtomicU64>,
    pub customer: Arc<CustomerService>,
    pub profiling: Arc<ProfilingService>,
    pub notifications: Arc<NotificationService>,
}

impl ServiceRuntime {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self::with_broker(config, InMemoryBroker::with_limits(config.partitions, config.retention))
    }

    /// Build on an existing broker, e.g. one a test controls.
    pub fn with_broker(config: &RuntimeConfig, broker: InMemoryBroker) -> Self {
        let client = |bus: BusConfig| Arc::new(BrokerClient::new(config.apply(bus), &broker));

        let customer_bus = client(svc_customer::bus_config());
        let profiling_bus = client(svc_profiling::bus_config());
        let notifications_bus = client(svc_notifications::bus_config());
        let audit_bus = client(
            BusConfig::from_env(AUDIT_CLIENT_ID, AUDIT_GROUP_ID)
                .with_topics(TopicContract::new(Vec::<String>::new(), topics::ALL)),
        );

        Self {
            customer: CustomerService::new(Arc::clone(&customer_bus)),
            profiling: ProfilingService::new(Arc::clone(&profiling_bus)),
            notifications: NotificationService::new(Arc::clone(&notifications_bus)),
            broker,
            customer_bus,
            profiling_bus,
            notifications_bus,
            audit_bus,
            audited: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn broker(&self) -> &InMemoryBroker {
        &self.broker
    }

    /// Connect and subscribe every service.
    ///
    /// # Errors
    ///
    /// The first client that fails to connect or subscribe; nothing is served.
    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Customer Event Mesh v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let (customer, profiling, notifications, audit) = tokio::join!(
            self.customer_bus.start(),
            self.profiling_bus.start(),
            self.notifications_bus.start(),
            self.audit_bus.start(),
        );
        customer.context("Customer service could not connect to the broker")?;
        profiling.context("Profiling service could not connect to the broker")?;
        notifications.context("Notification service could not connect to the broker")?;
        audit.context("Audit tap could not connect to the broker")?;

        self.customer_bus
            .subscribe_many(svc_customer::bindings(&self.customer))
            .await
            .context("Customer service subscription failed")?;
        self.profiling_bus
            .subscribe_many(svc_profiling::bindings(&self.profiling))
            .await
            .context("Profiling service subscription failed")?;
        self.notifications_bus
            .subscribe_many(svc_notifications::bindings(&self.notifications))
            .await
            .context("Notification service subscription failed")?;
        self.audit_bus
            .subscribe_many(audit_bindings(&self.audited))
            .await
            .context("Audit tap subscription failed")?;

        info!(
            brokers = %self.customer_bus.config().brokers_display(),
            "All services connected and subscribed"
        );
        Ok(())
    }

    /// Stop every client. Never fails.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        tokio::join!(
            self.customer_bus.stop(),
            self.profiling_bus.stop(),
            self.notifications_bus.stop(),
            self.audit_bus.stop(),
        );
        info!("Shutdown complete");
    }

    /// Diagnostics of every client, in startup order.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<ClientDiagnostics> {
        [
            &self.customer_bus,
            &self.profiling_bus,
            &self.notifications_bus,
            &self.audit_bus,
        ]
        .into_iter()
        .map(|bus| bus.get_config())
        .collect()
    }

    /// Events seen by the audit tap.
    #[must_use]
    pub fn audited_events(&self) -> u64 {
        self.audited.load(Ordering::SeqCst)
    }
}

/// One binding per known topic that logs the decoded event.
fn audit_bindings(audited: &Arc<AtomicU64>) -> Vec<HandlerBinding> {
    topics::ALL
        .into_iter()
        .map(|topic| {
            let audited = Arc::clone(audited);
            HandlerBinding::from_fn(topic, move |message| {
                let audited = Arc::clone(&audited);
                async move {
                    let event = BusEvent::from_message(&message)?;
                    audited.fetch_add(1, Ordering::SeqCst);
                    info!(
                        topic = event.topic(),
                        customer_id = %event.customer_id(),
                        offset = message.offset,
                        "Audit"
                    );
                    Ok::<(), HandlerError>(())
                }
            })
        })
        .collect()
}
