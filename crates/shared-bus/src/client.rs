//! # Broker Client
//!
//! The component every service embeds. It owns exactly one producer and one
//! consumer, enforces the service's topic contract on both paths, and
//! multiplexes every consumed topic through a single consumption loop.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──→ start() ──→ subscribe_many() ──→ ... publish() ... ──→ stop()
//!            │               │
//!            │               └── first call spawns the consumption loop
//!            └── producer and consumer connect concurrently
//! ```
//!
//! `start()` must be called exactly once per process, before any
//! subscription. `stop()` is best-effort and never fails.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::try_join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::BusConfig;
use crate::contract::{ContractDirection, TopicContract};
use crate::dispatch::{ConsumptionLoop, Router};
use crate::envelope::{Envelope, RecordMetadata};
use crate::errors::{ConnectionError, PublishError, SubscribeError};
use crate::handler::{HandlerBinding, MessageHandler};
use crate::transport::{Consumer, Producer, Transport};

/// Read-only snapshot for diagnostics endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDiagnostics {
    pub client_id: String,
    pub group_id: String,
    pub topics: TopicContract,
    pub is_consumer_running: bool,
}

/// Event bus client owning one producer and one consumer.
pub struct BrokerClient {
    config: BusConfig,
    producer: Arc<dyn Producer>,
    consumer: Arc<dyn Consumer>,
    router: Arc<Router>,
    /// Set once the consumption loop has been spawned.
    running: AtomicBool,
    loops_started: AtomicUsize,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl BrokerClient {
    /// Build a client whose handles come from `transport`. Nothing connects yet.
    pub fn new(config: BusConfig, transport: &dyn Transport) -> Self {
        let producer = transport.producer(&config);
        let consumer = transport.consumer(&config);
        Self {
            config,
            producer,
            consumer,
            router: Arc::new(Router::new()),
            running: AtomicBool::new(false),
            loops_started: AtomicUsize::new(0),
            loop_handle: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Connect producer and consumer concurrently.
    ///
    /// # Errors
    ///
    /// `ConnectionError` naming the side(s) that failed. The owning service
    /// must not begin serving when this fails.
    pub async fn start(&self) -> Result<(), ConnectionError> {
        info!(
            client_id = %self.config.client_id,
            brokers = %self.config.brokers_display(),
            "Connecting producer and consumer"
        );

        let (producer, consumer) =
            tokio::join!(self.producer.connect(), self.consumer.connect());

        let result = match (producer, consumer) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) => Err(ConnectionError::Producer(e)),
            (Ok(()), Err(e)) => Err(ConnectionError::Consumer(e)),
            (Err(producer), Err(consumer)) => Err(ConnectionError::Both { producer, consumer }),
        };

        match &result {
            Ok(()) => info!(
                client_id = %self.config.client_id,
                group_id = %self.config.group_id,
                "Producer and consumer connected"
            ),
            Err(e) => error!(client_id = %self.config.client_id, error = %e, "Error connecting to broker"),
        }
        result
    }

    /// Disconnect both handles and wait for the consumption loop to end.
    ///
    /// Failures are logged, never returned.
    pub async fn stop(&self) {
        if let Err(e) = self.producer.disconnect().await {
            error!(client_id = %self.config.client_id, error = %e, "Error disconnecting producer");
        }
        if let Err(e) = self.consumer.disconnect().await {
            error!(client_id = %self.config.client_id, error = %e, "Error disconnecting consumer");
        }

        let handle = self.loop_handle.lock().take();
        if let Some(mut handle) = handle {
            let grace = self.config.tuning.session_timeout();
            match tokio::time::timeout(grace, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(client_id = %self.config.client_id, error = %e, "Consumer loop ended abnormally");
                }
                Err(_) => {
                    error!(
                        client_id = %self.config.client_id,
                        grace_ms = grace.as_millis() as u64,
                        "Consumer loop did not stop in time; aborting"
                    );
                    handle.abort();
                }
            }
        }
        self.running.store(false, Ordering::SeqCst);

        info!(client_id = %self.config.client_id, "Producer and consumer disconnected");
    }

    /// Publish `payload` as JSON on `topic`.
    ///
    /// The key defaults to the payload's `customerId`, else the current time in
    /// milliseconds. Failures are returned to the caller and never retried here.
    pub async fn publish<T>(
        &self,
        topic: &str,
        payload: &T,
        key: Option<&str>,
    ) -> Result<RecordMetadata, PublishError>
    where
        T: Serialize + ?Sized,
    {
        self.config
            .topics
            .check(ContractDirection::Emit, topic, self.config.enforcement)?;

        let serialize_error = |source| PublishError::Serialize {
            topic: topic.to_string(),
            source,
        };
        let value = serde_json::to_value(payload).map_err(serialize_error)?;
        let envelope = Envelope::encode(&value, key).map_err(serialize_error)?;
        let partition_key = envelope.key.clone();

        match self.producer.send(topic, envelope).await {
            Ok(metadata) => {
                info!(
                    topic = %topic,
                    key = %partition_key,
                    payload = %value,
                    "Event published"
                );
                Ok(metadata)
            }
            Err(source) => {
                error!(topic = %topic, error = %source, "Error publishing event");
                Err(PublishError::Transport {
                    topic: topic.to_string(),
                    source,
                })
            }
        }
    }

    /// Subscribe to every binding's topic and route it to its handler.
    ///
    /// The first successful call spawns the consumption loop; later calls only
    /// extend the routing table the running loop already consults. A topic
    /// bound twice keeps the last handler.
    pub async fn subscribe_many(&self, bindings: Vec<HandlerBinding>) -> Result<(), SubscribeError> {
        if bindings.is_empty() {
            return Err(SubscribeError::NoBindings);
        }
        info!(client_id = %self.config.client_id, count = bindings.len(), "Subscribing to topics");

        for binding in &bindings {
            self.config.topics.check(
                ContractDirection::Consume,
                &binding.topic,
                self.config.enforcement,
            )?;
        }

        // Routes go in first so a record taken for a new topic always finds its handler.
        let topics: Vec<String> = bindings.iter().map(|b| b.topic.clone()).collect();
        let mut replaced = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let previous = self.router.insert(binding.topic.clone(), binding.handler);
            if previous.is_some() {
                debug!(topic = %binding.topic, "Replaced existing handler");
            }
            replaced.push((binding.topic, previous));
        }

        let subscribed = try_join_all(topics.iter().map(|topic| async move {
            self.consumer
                .subscribe(topic, true)
                .await
                .map_err(|source| SubscribeError::Transport {
                    topic: topic.clone(),
                    source,
                })
        }))
        .await;

        if let Err(e) = subscribed {
            for (topic, previous) in replaced.into_iter().rev() {
                match previous {
                    Some(handler) => {
                        self.router.insert(topic, handler);
                    }
                    None => {
                        self.router.remove(&topic);
                    }
                }
            }
            return Err(e);
        }

        self.ensure_consumer_running();

        info!(
            client_id = %self.config.client_id,
            topics = %topics.join(", "),
            "Subscribed to topics"
        );
        Ok(())
    }

    /// Subscribe a single topic.
    pub async fn subscribe(
        &self,
        topic: impl Into<String>,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), SubscribeError> {
        self.subscribe_many(vec![HandlerBinding::new(topic, handler)])
            .await
    }

    /// Spawn the consumption loop unless it is already running.
    fn ensure_consumer_running(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        info!(client_id = %self.config.client_id, "Starting consumer");
        let consumption = ConsumptionLoop {
            client_id: self.config.client_id.clone(),
            consumer: Arc::clone(&self.consumer),
            router: Arc::clone(&self.router),
            mode: self.config.dispatch,
            retry_delay: self.config.tuning.initial_retry(),
        };
        self.loops_started.fetch_add(1, Ordering::SeqCst);
        *self.loop_handle.lock() = Some(tokio::spawn(consumption.run()));
    }

    /// Whether the consumption loop has been started.
    #[must_use]
    pub fn is_consumer_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// How many consumption loops this client has spawned.
    #[must_use]
    pub fn loops_started(&self) -> usize {
        self.loops_started.load(Ordering::SeqCst)
    }

    /// Topics that currently have a handler.
    #[must_use]
    pub fn routed_topics(&self) -> Vec<String> {
        self.router.topics()
    }

    /// Identity, contract and loop state.
    #[must_use]
    pub fn get_config(&self) -> ClientDiagnostics {
        ClientDiagnostics {
            client_id: self.config.client_id.clone(),
            group_id: self.config.group_id.clone(),
            topics: self.config.topics.clone(),
            is_consumer_running: self.is_consumer_running(),
        }
    }
}
