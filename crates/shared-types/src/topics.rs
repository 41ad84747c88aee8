//! # Topic Names
//!
//! Every topic exchanged between the services. Producers and consumers must
//! agree on these strings; there is no registry on the broker side.

pub const CUSTOMER_ONBOARDED: &str = "customer.onboarded";
pub const CUSTOMER_ACTIVATED: &str = "customer.activated";
pub const CUSTOMER_DEACTIVATED: &str = "customer.deactivated";
pub const CUSTOMER_FIRST_PAYMENT: &str = "customer.first_payment";
pub const CUSTOMER_PROMOTED: &str = "customer.promoted";
pub const CUSTOMER_PROFILED: &str = "customer.profiled";
pub const NOTIFICATION_SENT: &str = "notification.sent";

/// All known topics, in lifecycle order.
pub const ALL: [&str; 7] = [
    CUSTOMER_ONBOARDED,
    CUSTOMER_ACTIVATED,
    CUSTOMER_DEACTIVATED,
    CUSTOMER_FIRST_PAYMENT,
    CUSTOMER_PROMOTED,
    CUSTOMER_PROFILED,
    NOTIFICATION_SENT,
];

/// Whether `topic` is one of [`ALL`].
#[must_use]
pub fn is_known(topic: &str) -> bool {
    ALL.contains(&topic)
}
