use shared_bus::PublishError;
use shared_types::ValidationError;
use thiserror::Error;

/// Errors returned by the notification façade.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to publish notification event: {0}")]
    Publish(#[from] PublishError),
}

impl From<NotificationError> for shared_bus::HandlerError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Publish(e) => Self::Publish(e),
            other => Self::failed(other),
        }
    }
}
