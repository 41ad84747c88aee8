//! End-to-end flows across all services on one in-memory broker.

use std::time::Duration;

use service_runtime::{run_demo, RuntimeConfig, ServiceRuntime};
use shared_bus::{ContractEnforcement, DispatchMode, InMemoryBroker};
use shared_types::{topics, CustomerStatus};
use svc_customer::OnboardCustomer;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(3);

async fn eventually(mut condition: impl FnMut() -> bool) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn ana() -> OnboardCustomer {
    OnboardCustomer {
        name: "Ana".into(),
        email: "ana@example.com".into(),
        phone: "600".into(),
        ..OnboardCustomer::default()
    }
}

#[tokio::test]
async fn test_onboarding_choreography() {
    let runtime = ServiceRuntime::new(&RuntimeConfig::default());
    runtime.start().await.unwrap();

    let id = runtime.customer.onboard(ana()).await.unwrap().customer_id;

    // profiling reacts, notifications email and report back to customer
    eventually(|| runtime.profiling.profile(&id).is_some()).await;
    eventually(|| runtime.customer.notifications_seen() == 1).await;

    let delivered = runtime.notifications.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].template, "welcome");
    assert_eq!(delivered[0].recipient, "ana@example.com");

    // onboarded + profiled + notification.sent
    eventually(|| runtime.audited_events() == 3).await;

    runtime.shutdown().await;
    assert!(runtime.diagnostics().iter().all(|d| !d.is_consumer_running));
}

#[tokio::test]
async fn test_every_client_has_own_group() {
    let runtime = ServiceRuntime::new(&RuntimeConfig::default());
    runtime.start().await.unwrap();

    let diagnostics = runtime.diagnostics();
    let groups: Vec<&str> = diagnostics.iter().map(|d| d.group_id.as_str()).collect();
    assert_eq!(
        groups,
        [
            svc_customer::GROUP_ID,
            svc_profiling::GROUP_ID,
            svc_notifications::GROUP_ID,
            service_runtime::runtime::AUDIT_GROUP_ID,
        ]
    );
    assert!(diagnostics.iter().all(|d| d.is_consumer_running));

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_start_fails_fast_when_broker_down() {
    let broker = InMemoryBroker::new();
    broker.set_online(false);
    let runtime = ServiceRuntime::with_broker(&RuntimeConfig::default(), broker);

    let err = runtime.start().await.unwrap_err();
    assert!(format!("{err:#}").contains("could not connect"));
    assert!(runtime.diagnostics().iter().all(|d| !d.is_consumer_running));
}

#[tokio::test]
async fn test_demo_under_strict_per_topic() {
    let config = RuntimeConfig {
        dispatch: DispatchMode::PerTopic { queue_capacity: 8 },
        enforcement: ContractEnforcement::Strict,
        partitions: 3,
        retention: 1_000,
        demo: true,
    };
    let runtime = ServiceRuntime::new(&config);
    runtime.start().await.unwrap();

    let id = run_demo(&runtime).await.unwrap();

    let customer = runtime.customer.get(&id).unwrap();
    assert_eq!(customer.status, CustomerStatus::Premium);
    assert!(customer.has_first_payment);

    // welcome, activation and promotion emails plus one SMS
    eventually(|| runtime.notifications.delivered().len() == 4).await;
    eventually(|| runtime.customer.notifications_seen() == 3).await;
    assert_eq!(runtime.broker().partitions(), 3);
    assert_eq!(runtime.broker().retention(), 1_000);
    assert!(!runtime.broker().records(topics::CUSTOMER_PROFILED).is_empty());

    runtime.shutdown().await;
}
