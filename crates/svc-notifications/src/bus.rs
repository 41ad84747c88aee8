//! # Notification Bus Wiring
//!
//! | Direction | Topics |
//! |-----------|--------|
//! | emit | `notification.sent` |
//! | consume | `customer.onboarded`, `customer.activated`, `customer.promoted` |

use std::sync::Arc;

use shared_bus::{HandlerBinding, TopicContract};
use shared_types::{topics, CustomerActivated, CustomerOnboarded, CustomerPromoted};

use crate::service::NotificationService;
use crate::templates::Template;

#[must_use]
pub fn contract() -> TopicContract {
    TopicContract::new(
        [topics::NOTIFICATION_SENT],
        [
            topics::CUSTOMER_ONBOARDED,
            topics::CUSTOMER_ACTIVATED,
            topics::CUSTOMER_PROMOTED,
        ],
    )
}

pub fn bindings(service: &Arc<NotificationService>) -> Vec<HandlerBinding> {
    let onboarded = Arc::clone(service);
    let activated = Arc::clone(service);
    let promoted = Arc::clone(service);
    vec![
        HandlerBinding::typed(topics::CUSTOMER_ONBOARDED, move |event: CustomerOnboarded| {
            let service = Arc::clone(&onboarded);
            async move {
                service
                    .notify(Template::Welcome, &event.customer_id, &event.customer)
                    .await
            }
        }),
        HandlerBinding::typed(topics::CUSTOMER_ACTIVATED, move |event: CustomerActivated| {
            let service = Arc::clone(&activated);
            async move {
                service
                    .notify(Template::AccountActivated, &event.customer_id, &event.customer)
                    .await
            }
        }),
        HandlerBinding::typed(topics::CUSTOMER_PROMOTED, move |event: CustomerPromoted| {
            let service = Arc::clone(&promoted);
            async move {
                service
                    .notify(Template::Promotion, &event.customer_id, &event.customer)
                    .await
            }
        }),
    ]
}
