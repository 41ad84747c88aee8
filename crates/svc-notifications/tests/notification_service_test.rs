//! Notification service over the in-memory broker.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use shared_bus::{BrokerClient, BusConfig, HandlerBinding, HandlerError, InMemoryBroker};
use shared_types::{
    topics, Customer, CustomerActivated, CustomerOnboarded, CustomerPromoted, CustomerStatus,
    NotificationSent,
};
use svc_notifications::{
    Channel, DeliverySettings, NotificationError, NotificationService, SendEmail, SendSms,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_millis(500);

struct Harness {
    service: Arc<NotificationService>,
    customer_bus: BrokerClient,
    sent: mpsc::UnboundedReceiver<NotificationSent>,
}

async fn harness() -> Harness {
    let broker = InMemoryBroker::new();

    let bus = Arc::new(BrokerClient::new(
        BusConfig::new(svc_notifications::CLIENT_ID, svc_notifications::GROUP_ID)
            .with_topics(svc_notifications::contract()),
        &broker,
    ));
    bus.start().await.unwrap();
    let service = NotificationService::with_settings(
        Arc::clone(&bus),
        DeliverySettings {
            email_delay: Duration::from_millis(1),
            sms_delay: Duration::from_millis(1),
        },
    );
    bus.subscribe_many(svc_notifications::bindings(&service)).await.unwrap();

    let customer_bus = BrokerClient::new(BusConfig::new("service-customer", "customers-group"), &broker);
    customer_bus.start().await.unwrap();
    let (tx, sent) = mpsc::unbounded_channel();
    customer_bus
        .subscribe_many(vec![HandlerBinding::typed(
            topics::NOTIFICATION_SENT,
            move |event: NotificationSent| {
                let tx = tx.clone();
                async move {
                    tx.send(event).map_err(HandlerError::failed)?;
                    Ok::<(), HandlerError>(())
                }
            },
        )])
        .await
        .unwrap();

    Harness {
        service,
        customer_bus,
        sent,
    }
}

fn customer(id: &str, email: &str, status: CustomerStatus) -> Customer {
    Customer {
        id: id.into(),
        name: "Marta".into(),
        email: email.into(),
        phone: "600".into(),
        document_type: None,
        document_number: None,
        birth_date: None,
        address: None,
        city: None,
        country: None,
        status,
        created_at: Utc::now(),
        activated_at: None,
        deactivated_at: None,
        first_payment_at: None,
        has_first_payment: false,
        promoted_at: None,
    }
}

async fn next_sent(rx: &mut mpsc::UnboundedReceiver<NotificationSent>) -> NotificationSent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for notification.sent")
        .expect("channel closed")
}

#[tokio::test]
async fn test_welcome_email_on_onboarding() {
    let mut h = harness().await;

    h.customer_bus
        .publish(
            topics::CUSTOMER_ONBOARDED,
            &CustomerOnboarded {
                customer_id: "c1".into(),
                customer: customer("c1", "marta@example.com", CustomerStatus::Onboarded),
                timestamp: Utc::now(),
            },
            None,
        )
        .await
        .unwrap();

    let sent = next_sent(&mut h.sent).await;
    assert_eq!(sent.customer_id, "c1");
    assert_eq!(sent.channel, "email");
    assert_eq!(sent.template, "welcome");
    assert_eq!(sent.recipient, "marta@example.com");

    let delivered = h.service.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].channel, Channel::Email);
}

#[tokio::test]
async fn test_templates_per_topic() {
    let mut h = harness().await;

    h.customer_bus
        .publish(
            topics::CUSTOMER_ACTIVATED,
            &CustomerActivated {
                customer_id: "c2".into(),
                customer: customer("c2", "c2@example.com", CustomerStatus::Active),
                timestamp: Utc::now(),
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(next_sent(&mut h.sent).await.template, "account-activated");

    h.customer_bus
        .publish(
            topics::CUSTOMER_PROMOTED,
            &CustomerPromoted {
                customer_id: "c2".into(),
                customer: customer("c2", "c2@example.com", CustomerStatus::Premium),
                timestamp: Utc::now(),
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(next_sent(&mut h.sent).await.template, "promotion");
}

#[tokio::test]
async fn test_missing_email_uses_fallback_recipient() {
    let mut h = harness().await;

    h.customer_bus
        .publish(
            topics::CUSTOMER_ONBOARDED,
            &CustomerOnboarded {
                customer_id: "c3".into(),
                customer: customer("c3", "", CustomerStatus::Onboarded),
                timestamp: Utc::now(),
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        next_sent(&mut h.sent).await.recipient,
        svc_notifications::templates::FALLBACK_RECIPIENT
    );
}

#[tokio::test]
async fn test_invalid_recipient_isolated() {
    let mut h = harness().await;

    // Handler fails validation on the bad address; the next event still flows.
    h.customer_bus
        .publish(
            topics::CUSTOMER_ONBOARDED,
            &CustomerOnboarded {
                customer_id: "bad".into(),
                customer: customer("bad", "not-an-address", CustomerStatus::Onboarded),
                timestamp: Utc::now(),
            },
            None,
        )
        .await
        .unwrap();
    h.customer_bus
        .publish(
            topics::CUSTOMER_ONBOARDED,
            &CustomerOnboarded {
                customer_id: "good".into(),
                customer: customer("good", "good@example.com", CustomerStatus::Onboarded),
                timestamp: Utc::now(),
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(next_sent(&mut h.sent).await.customer_id, "good");
    assert_eq!(h.service.delivered().len(), 1);
}

#[tokio::test]
async fn test_send_email_facade() {
    let h = harness().await;

    let receipt = h
        .service
        .send_email(SendEmail {
            customer_id: None,
            to: "ops@example.com".into(),
            subject: "Report".into(),
            template: "daily-report".into(),
            data: json!({"rows": 3}),
        })
        .await
        .unwrap();

    assert!(receipt.message_id.starts_with("email_"));
    assert_eq!(receipt.recipient, "ops@example.com");
}

#[tokio::test]
async fn test_send_sms_facade() {
    let h = harness().await;

    let receipt = h
        .service
        .send_sms(SendSms {
            customer_id: "c9".into(),
            phone: "+34600999888".into(),
            template: "otp".into(),
            data: json!({"code": "4711"}),
        })
        .await
        .unwrap();
    assert_eq!(receipt.channel, Channel::Sms);
    assert!(receipt.message_id.starts_with("sms_"));

    let err = h
        .service
        .send_sms(SendSms {
            customer_id: "c9".into(),
            phone: "+34600999888".into(),
            template: String::new(),
            data: json!({}),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, NotificationError::Validation(ref v) if v.field == "template"));
    assert_eq!(h.service.delivered().len(), 1);
}
