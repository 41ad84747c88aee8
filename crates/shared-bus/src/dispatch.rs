//! # Consumption Loop
//!
//! One loop per client drains the consumer and routes every record to the
//! handler registered for its topic.
//!
//! ## Failure Isolation
//!
//! Each message is handled in its own task. An empty body, a decode failure,
//! a missing handler, a handler error or a handler panic is logged with the
//! topic and the loop moves on to the next record.
//!
//! Handler tasks and topic workers are owned by `JoinSet`s, so aborting the
//! loop aborts everything it spawned.
//!
//! ## Dispatch Modes
//!
//! ```text
//! Shared:    consumer ──→ loop ──→ handler(A) ──→ handler(B) ──→ ...
//!
//! PerTopic:  consumer ──→ loop ──┬──→ queue(A) ──→ worker(A) ──→ handler(A)
//!                                └──→ queue(B) ──→ worker(B) ──→ handler(B)
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::DispatchMode;
use crate::envelope::{InboundMessage, RawMessage};
use crate::errors::HandlerError;
use crate::handler::MessageHandler;
use crate::transport::Consumer;

/// What happened to one inbound record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The handler completed successfully.
    Handled,
    /// The record had no body and was skipped.
    Empty,
    /// No handler is registered for the topic; the record was dropped.
    NoHandler,
    /// The body was not valid JSON.
    DecodeFailed,
    /// The handler returned an error or panicked.
    HandlerFailed,
}

/// Topic-to-handler routing table owned by one client.
///
/// Consulted on every inbound record, so handlers registered after the loop
/// started are reachable without restarting it.
#[derive(Default)]
pub struct Router {
    routes: RwLock<HashMap<String, Arc<dyn MessageHandler>>>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`, returning the handler it replaced.
    pub fn insert(
        &self,
        topic: impl Into<String>,
        handler: Arc<dyn MessageHandler>,
    ) -> Option<Arc<dyn MessageHandler>> {
        self.routes.write().insert(topic.into(), handler)
    }

    /// Drop the route for `topic`, returning its handler.
    pub fn remove(&self, topic: &str) -> Option<Arc<dyn MessageHandler>> {
        self.routes.write().remove(topic)
    }

    #[must_use]
    pub fn get(&self, topic: &str) -> Option<Arc<dyn MessageHandler>> {
        self.routes.read().get(topic).cloned()
    }

    /// Registered topics in sorted order.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.routes.read().keys().cloned().collect();
        topics.sort();
        topics
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}

/// Decode one record and run its handler, absorbing every failure.
pub async fn deliver(router: &Router, raw: RawMessage) -> Delivery {
    if raw.is_empty() {
        warn!(topic = %raw.topic, offset = raw.offset, "Message received without value");
        return Delivery::Empty;
    }

    let topic = raw.topic.clone();
    let message = match InboundMessage::from_raw(raw) {
        Ok(message) => message,
        Err(e) => {
            error!(topic = %topic, error = %e, "Error processing message");
            return Delivery::DecodeFailed;
        }
    };

    info!(
        topic = %topic,
        key = message.key.as_deref().unwrap_or(""),
        partition = message.partition,
        offset = message.offset,
        payload = %message.payload,
        "Message received"
    );

    let Some(handler) = router.get(&topic) else {
        warn!(topic = %topic, "No handler registered for topic");
        return Delivery::NoHandler;
    };

    // A task per message keeps a panicking handler from unwinding the loop.
    let mut task = JoinSet::new();
    task.spawn(async move { handler.handle(message).await });
    let result = match task.join_next().await {
        Some(Ok(result)) => result,
        Some(Err(join_error)) if join_error.is_panic() => Err(HandlerError::Panicked(
            panic_reason(join_error.into_panic()),
        )),
        Some(Err(_)) | None => Err(HandlerError::Panicked("handler task cancelled".to_string())),
    };

    match result {
        Ok(()) => Delivery::Handled,
        Err(e @ HandlerError::Panicked(_)) => {
            error!(topic = %topic, error = %e, "Handler panicked while processing message");
            Delivery::HandlerFailed
        }
        Err(e) => {
            error!(topic = %topic, error = %e, "Error processing message");
            Delivery::HandlerFailed
        }
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// The single consumption loop of a client.
pub(crate) struct ConsumptionLoop {
    pub(crate) client_id: String,
    pub(crate) consumer: Arc<dyn Consumer>,
    pub(crate) router: Arc<Router>,
    pub(crate) mode: DispatchMode,
    /// Pause after a transport error before polling again.
    pub(crate) retry_delay: Duration,
}

impl ConsumptionLoop {
    /// Run until the consumer reports it was disconnected.
    pub(crate) async fn run(self) {
        info!(client_id = %self.client_id, mode = ?self.mode, "Consumer loop started");

        let mut workers = match self.mode {
            DispatchMode::Shared => None,
            DispatchMode::PerTopic { queue_capacity } => {
                Some(TopicWorkers::new(Arc::clone(&self.router), queue_capacity))
            }
        };

        loop {
            match self.consumer.next_message().await {
                Ok(Some(raw)) => match workers.as_mut() {
                    None => {
                        deliver(&self.router, raw).await;
                    }
                    Some(workers) => workers.route(raw).await,
                },
                Ok(None) => break,
                Err(e) => {
                    error!(client_id = %self.client_id, error = %e, "Failed to fetch message");
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }

        if let Some(workers) = workers {
            workers.shutdown().await;
        }
        info!(client_id = %self.client_id, "Consumer loop stopped");
    }
}

/// Per-topic queues and the workers draining them.
struct TopicWorkers {
    router: Arc<Router>,
    capacity: usize,
    queues: HashMap<String, mpsc::Sender<RawMessage>>,
    /// Dropping the set aborts every worker.
    workers: JoinSet<()>,
}

impl TopicWorkers {
    fn new(router: Arc<Router>, capacity: usize) -> Self {
        Self {
            router,
            capacity: capacity.max(1),
            queues: HashMap::new(),
            workers: JoinSet::new(),
        }
    }

    async fn route(&mut self, raw: RawMessage) {
        let topic = raw.topic.clone();
        let queue = self.queue_for(&topic);
        if queue.send(raw).await.is_err() {
            error!(topic = %topic, "Topic worker is gone; message dropped");
        }
    }

    fn queue_for(&mut self, topic: &str) -> mpsc::Sender<RawMessage> {
        if let Some(queue) = self.queues.get(topic) {
            return queue.clone();
        }

        let (tx, mut rx) = mpsc::channel::<RawMessage>(self.capacity);
        let router = Arc::clone(&self.router);
        let worker_topic = topic.to_string();
        self.workers.spawn(async move {
            debug!(topic = %worker_topic, "Topic worker started");
            while let Some(raw) = rx.recv().await {
                deliver(&router, raw).await;
            }
            debug!(topic = %worker_topic, "Topic worker stopped");
        });
        self.queues.insert(topic.to_string(), tx.clone());
        tx
    }

    /// Close every queue and wait for the workers to drain them.
    async fn shutdown(mut self) {
        self.queues.clear();
        while let Some(result) = self.workers.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Topic worker ended abnormally");
            }
        }
    }
}
