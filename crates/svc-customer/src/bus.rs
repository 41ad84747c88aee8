//! # Customer Bus Wiring
//!
//! | Direction | Topics |
//! |-----------|--------|
//! | emit | `customer.onboarded`, `customer.activated`, `customer.deactivated`, `customer.first_payment`, `customer.promoted` |
//! | consume | `notification.sent` |

use std::sync::Arc;

use shared_bus::{HandlerBinding, HandlerError, TopicContract};
use shared_types::{topics, NotificationSent};

use crate::service::CustomerService;

/// Topics this service may emit and consume.
#[must_use]
pub fn contract() -> TopicContract {
    TopicContract::new(
        [
            topics::CUSTOMER_ONBOARDED,
            topics::CUSTOMER_ACTIVATED,
            topics::CUSTOMER_DEACTIVATED,
            topics::CUSTOMER_FIRST_PAYMENT,
            topics::CUSTOMER_PROMOTED,
        ],
        [topics::NOTIFICATION_SENT],
    )
}

/// Handlers to register with `subscribe_many`.
pub fn bindings(service: &Arc<CustomerService>) -> Vec<HandlerBinding> {
    let on_notification = Arc::clone(service);
    vec![HandlerBinding::typed(
        topics::NOTIFICATION_SENT,
        move |notification: NotificationSent| {
            let service = Arc::clone(&on_notification);
            async move {
                service.record_notification(&notification);
                Ok::<(), HandlerError>(())
            }
        },
    )]
}
