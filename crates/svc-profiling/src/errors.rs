use shared_bus::PublishError;
use shared_types::ValidationError;
use thiserror::Error;

/// Errors returned by the profiling façade.
#[derive(Debug, Error)]
pub enum ProfilingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to publish profiling event: {0}")]
    Publish(#[from] PublishError),
}
