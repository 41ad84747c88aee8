//! # Customer Service Errors

use shared_bus::PublishError;
use shared_types::ValidationError;
use thiserror::Error;

/// Errors returned by the customer façade.
#[derive(Debug, Error)]
pub enum CustomerError {
    /// Request rejected before any state change.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Customer not found: {0}")]
    NotFound(String),

    #[error("First payment already recorded for customer {0}")]
    FirstPaymentAlreadyRecorded(String),

    /// State was updated but the event could not be published.
    #[error("Failed to publish customer event: {0}")]
    Publish(#[from] PublishError),
}

impl CustomerError {
    /// Whether the caller sent a bad request (as opposed to a bus failure).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Publish(_))
    }
}
