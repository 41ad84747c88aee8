//! # Message Handlers
//!
//! A handler is bound to one topic and invoked once per inbound message on
//! that topic. Errors it returns are logged by the consumption loop and never
//! stop it.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::envelope::InboundMessage;
use crate::errors::HandlerError;

/// Callback invoked for each message on a bound topic.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: InboundMessage) -> Result<(), HandlerError>;
}

/// Adapts an async closure over the raw inbound message.
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(InboundMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, message: InboundMessage) -> Result<(), HandlerError> {
        (self.f)(message).await
    }
}

/// Wrap an async closure as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(InboundMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}

/// Decodes the payload into `T` before calling the closure.
///
/// A payload that does not match `T` fails with `HandlerError::Decode`.
pub struct TypedHandler<T, F> {
    f: F,
    _shape: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T, F, Fut> MessageHandler for TypedHandler<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, message: InboundMessage) -> Result<(), HandlerError> {
        let payload = message.decode::<T>()?;
        (self.f)(payload).await
    }
}

/// A topic paired with the handler that serves it.
#[derive(Clone)]
pub struct HandlerBinding {
    pub topic: String,
    pub handler: Arc<dyn MessageHandler>,
}

impl HandlerBinding {
    pub fn new(topic: impl Into<String>, handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            topic: topic.into(),
            handler,
        }
    }

    /// Bind an async closure over the raw inbound message.
    pub fn from_fn<F, Fut>(topic: impl Into<String>, f: F) -> Self
    where
        F: Fn(InboundMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Self::new(topic, handler_fn(f))
    }

    /// Bind an async closure that receives the payload decoded as `T`.
    pub fn typed<T, F, Fut>(topic: impl Into<String>, f: F) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Self::new(
            topic,
            Arc::new(TypedHandler {
                f,
                _shape: PhantomData,
            }),
        )
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn message(payload: serde_json::Value) -> InboundMessage {
        InboundMessage {
            topic: "customer.onboarded".to_string(),
            key: Some("c1".to_string()),
            partition: 0,
            offset: 0,
            timestamp: 0,
            payload,
        }
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Onboarded {
        customer_id: String,
    }

    #[tokio::test]
    async fn test_fn_handler_receives_message() {
        let binding = HandlerBinding::from_fn("customer.onboarded", |msg| async move {
            if msg.payload["customerId"] == "c1" {
                Ok::<(), HandlerError>(())
            } else {
                Err(HandlerError::failed("wrong payload"))
            }
        });

        assert_eq!(binding.topic, "customer.onboarded");
        assert!(binding
            .handler
            .handle(message(json!({"customerId": "c1"})))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_typed_handler_decodes() {
        let binding = HandlerBinding::typed("customer.onboarded", |event: Onboarded| async move {
            assert_eq!(event.customer_id, "c1");
            Ok::<(), HandlerError>(())
        });

        let result = binding
            .handler
            .handle(message(json!({"customerId": "c1"})))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_wrong_shape() {
        let binding =
            HandlerBinding::typed("customer.onboarded", |_: Onboarded| async move {
                Ok::<(), HandlerError>(())
            });

        let result = binding.handler.handle(message(json!({"id": 7}))).await;
        assert!(matches!(result, Err(HandlerError::Decode(_))));
    }
}
