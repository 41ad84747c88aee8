//! # Profiling Bus Wiring
//!
//! | Direction | Topics |
//! |-----------|--------|
//! | emit | `customer.profiled` |
//! | consume | `customer.onboarded`, `customer.activated` |

use std::sync::Arc;

use shared_bus::{HandlerBinding, TopicContract};
use shared_types::{topics, CustomerActivated, CustomerOnboarded};

use crate::service::ProfilingService;

#[must_use]
pub fn contract() -> TopicContract {
    TopicContract::new(
        [topics::CUSTOMER_PROFILED],
        [topics::CUSTOMER_ONBOARDED, topics::CUSTOMER_ACTIVATED],
    )
}

pub fn bindings(service: &Arc<ProfilingService>) -> Vec<HandlerBinding> {
    let onboarded = Arc::clone(service);
    let activated = Arc::clone(service);
    vec![
        HandlerBinding::typed(topics::CUSTOMER_ONBOARDED, move |event: CustomerOnboarded| {
            let service = Arc::clone(&onboarded);
            async move { service.on_customer_onboarded(event).await }
        }),
        HandlerBinding::typed(topics::CUSTOMER_ACTIVATED, move |event: CustomerActivated| {
            let service = Arc::clone(&activated);
            async move { service.on_customer_activated(event).await }
        }),
    ]
}
