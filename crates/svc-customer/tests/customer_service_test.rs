//! Customer service over the in-memory broker.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use shared_bus::{BrokerClient, BusConfig, HandlerBinding, HandlerError, InMemoryBroker, InboundMessage};
use shared_types::{topics, BusEvent, CustomerStatus, NotificationSent};
use svc_customer::{
    ActivateCustomer, CustomerError, CustomerService, DeactivateCustomer, FirstPayment,
    OnboardCustomer, PromoteCustomer,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_millis(500);

struct Harness {
    broker: InMemoryBroker,
    service: Arc<CustomerService>,
    _probe: BrokerClient,
    events: mpsc::UnboundedReceiver<InboundMessage>,
}

/// Customer service plus a probe client recording every customer event.
async fn harness() -> Harness {
    let broker = InMemoryBroker::new();

    let bus = Arc::new(BrokerClient::new(
        BusConfig::new(svc_customer::CLIENT_ID, svc_customer::GROUP_ID)
            .with_topics(svc_customer::contract()),
        &broker,
    ));
    bus.start().await.unwrap();
    let service = CustomerService::new(Arc::clone(&bus));
    bus.subscribe_many(svc_customer::bindings(&service)).await.unwrap();

    let probe = BrokerClient::new(BusConfig::new("probe", "probe-group"), &broker);
    probe.start().await.unwrap();
    let (tx, events) = mpsc::unbounded_channel();
    let bindings = [
        topics::CUSTOMER_ONBOARDED,
        topics::CUSTOMER_ACTIVATED,
        topics::CUSTOMER_DEACTIVATED,
        topics::CUSTOMER_FIRST_PAYMENT,
        topics::CUSTOMER_PROMOTED,
    ]
    .into_iter()
    .map(|topic| {
        let tx = tx.clone();
        HandlerBinding::from_fn(topic, move |message| {
            let tx = tx.clone();
            async move {
                tx.send(message).map_err(HandlerError::failed)?;
                Ok::<(), HandlerError>(())
            }
        })
    })
    .collect();
    probe.subscribe_many(bindings).await.unwrap();

    Harness {
        broker,
        service,
        _probe: probe,
        events,
    }
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<InboundMessage>) -> BusEvent {
    let message = timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("probe channel closed");
    BusEvent::from_message(&message).expect("known event shape")
}

fn ana() -> OnboardCustomer {
    OnboardCustomer {
        name: "Ana Torres".into(),
        email: "ana@example.com".into(),
        phone: "+34600111222".into(),
        city: Some("Sevilla".into()),
        ..OnboardCustomer::default()
    }
}

#[tokio::test]
async fn test_onboard_stores_and_publishes() {
    let mut h = harness().await;

    let receipt = h.service.onboard(ana()).await.unwrap();
    let stored = h.service.get(&receipt.customer_id).unwrap();
    assert_eq!(stored.status, CustomerStatus::Onboarded);
    assert_eq!(stored.city.as_deref(), Some("Sevilla"));

    match next_event(&mut h.events).await {
        BusEvent::CustomerOnboarded(event) => {
            assert_eq!(event.customer_id, receipt.customer_id);
            assert_eq!(event.customer, stored);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let records = h.broker.records(topics::CUSTOMER_ONBOARDED);
    assert_eq!(records[0].key.as_deref(), Some(receipt.customer_id.as_str()));
}

#[tokio::test]
async fn test_invalid_onboard_publishes_nothing() {
    let h = harness().await;

    let err = h
        .service
        .onboard(OnboardCustomer {
            email: "ana.example.com".into(),
            ..ana()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CustomerError::Validation(ref v) if v.field == "email"));
    assert!(err.is_client_error());
    assert!(h.service.list().is_empty());
    assert!(h.broker.records(topics::CUSTOMER_ONBOARDED).is_empty());
}

#[tokio::test]
async fn test_onboard_ids_unique() {
    let h = harness().await;

    let a = h.service.onboard(ana()).await.unwrap();
    let b = h.service.onboard(ana()).await.unwrap();

    assert_ne!(a.customer_id, b.customer_id);
    assert_eq!(h.service.list().len(), 2);
}

#[tokio::test]
async fn test_full_lifecycle_events_in_order() {
    let mut h = harness().await;
    let id = h.service.onboard(ana()).await.unwrap().customer_id;

    h.service
        .activate(ActivateCustomer {
            customer_id: id.clone(),
            activation_reason: "kyc passed".into(),
        })
        .await
        .unwrap();
    h.service
        .first_payment(FirstPayment {
            customer_id: id.clone(),
            amount: 49.9,
            payment_method: Some("card".into()),
            description: None,
        })
        .await
        .unwrap();
    h.service
        .promote(PromoteCustomer {
            customer_id: id.clone(),
        })
        .await
        .unwrap();
    h.service
        .deactivate(DeactivateCustomer {
            customer_id: id.clone(),
            deactivation_reason: "closed account".into(),
        })
        .await
        .unwrap();

    let mut seen = Vec::new();
    for _ in 0..5 {
        let event = next_event(&mut h.events).await;
        assert_eq!(event.customer_id(), id);
        seen.push(event.topic());
    }
    // The probe's loop interleaves topics, so compare as sets.
    seen.sort_unstable();
    let mut expected = vec![
        topics::CUSTOMER_ONBOARDED,
        topics::CUSTOMER_ACTIVATED,
        topics::CUSTOMER_FIRST_PAYMENT,
        topics::CUSTOMER_PROMOTED,
        topics::CUSTOMER_DEACTIVATED,
    ];
    expected.sort_unstable();
    assert_eq!(seen, expected);

    let customer = h.service.get(&id).unwrap();
    assert_eq!(customer.status, CustomerStatus::Inactive);
    assert!(customer.has_first_payment);
    assert!(customer.activated_at.is_some());
    assert!(customer.promoted_at.is_some());
}

#[tokio::test]
async fn test_unknown_customer_rejected() {
    let h = harness().await;

    let err = h
        .service
        .activate(ActivateCustomer {
            customer_id: "missing".into(),
            activation_reason: "test".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CustomerError::NotFound(ref id) if id == "missing"));
    assert!(h.broker.records(topics::CUSTOMER_ACTIVATED).is_empty());
}

#[tokio::test]
async fn test_second_first_payment_rejected() {
    let h = harness().await;
    let id = h.service.onboard(ana()).await.unwrap().customer_id;
    let payment = FirstPayment {
        customer_id: id.clone(),
        amount: 10.0,
        payment_method: None,
        description: Some("welcome pack".into()),
    };

    h.service.first_payment(payment.clone()).await.unwrap();
    let err = h.service.first_payment(payment).await.unwrap_err();

    assert!(matches!(err, CustomerError::FirstPaymentAlreadyRecorded(_)));
    assert_eq!(h.broker.records(topics::CUSTOMER_FIRST_PAYMENT).len(), 1);
}

#[tokio::test]
async fn test_publish_failure_surfaces() {
    let h = harness().await;
    h.broker.set_online(false);

    let err = h.service.onboard(ana()).await.unwrap_err();

    assert!(matches!(err, CustomerError::Publish(_)));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_consumes_notification_sent() {
    let h = harness().await;
    let notifier = BrokerClient::new(BusConfig::new("service-notifications", "notifications-group"), &h.broker);
    notifier.start().await.unwrap();

    let sent = NotificationSent {
        customer_id: "c1".into(),
        channel: "email".into(),
        template: "welcome".into(),
        recipient: "ana@example.com".into(),
        timestamp: chrono::Utc::now(),
    };
    notifier.publish(topics::NOTIFICATION_SENT, &sent, None).await.unwrap();
    // Wrong shape: logged and skipped.
    notifier
        .publish(topics::NOTIFICATION_SENT, &json!({"customerId": "c2"}), None)
        .await
        .unwrap();

    timeout(WAIT, async {
        while h.service.notifications_seen() < 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("notification not consumed");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.service.notifications_seen(), 1);
}

#[tokio::test]
async fn test_health_reports_bus_state() {
    let h = harness().await;
    h.service.onboard(ana()).await.unwrap();

    let health = h.service.health();
    assert_eq!(health.status, "ok");
    assert_eq!(health.service, svc_customer::CLIENT_ID);
    assert_eq!(health.customers, 1);
    assert!(health.bus.is_consumer_running);
    assert_eq!(health.bus.group_id, svc_customer::GROUP_ID);
}
