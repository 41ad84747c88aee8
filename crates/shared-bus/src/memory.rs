//! # In-Memory Broker
//!
//! An in-process broker that honours the transport contract.
//!
//! Suitable for single-process deployments and tests; distributed
//! deployments plug a networked implementation in behind the same traits.
//!
//! ## Semantics
//!
//! - Topics are created on first use with a fixed number of partitions.
//! - The partition of a record is chosen by hashing its key.
//! - Offsets are tracked per (group, topic, partition): consumers in one group
//!   share progress, distinct groups each see every record.
//! - An offset is committed when the record is handed out (at-most-once per group).
//! - Each partition keeps at most `retention` records; older ones are evicted
//!   and a group lagging behind the eviction point resumes at the oldest kept
//!   record.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::config::BusConfig;
use crate::envelope::{now_millis, Envelope, RawMessage, RecordMetadata};
use crate::errors::TransportError;
use crate::transport::{Consumer, Producer, Transport};

/// Partitions per topic unless configured otherwise.
pub const DEFAULT_PARTITIONS: u32 = 1;

/// Records kept per partition unless configured otherwise.
pub const DEFAULT_RETENTION: usize = 10_000;

#[derive(Debug, Clone)]
struct StoredRecord {
    key: Option<String>,
    value: Option<Vec<u8>>,
    timestamp: i64,
}

/// Records of one partition; `base` is the offset of the oldest kept record.
#[derive(Debug, Clone, Default)]
struct PartitionLog {
    base: u64,
    records: VecDeque<StoredRecord>,
}

impl PartitionLog {
    /// Offset the next appended record will get.
    fn end(&self) -> u64 {
        self.base + self.records.len() as u64
    }

    fn get(&self, offset: u64) -> Option<&StoredRecord> {
        let index = offset.checked_sub(self.base)?;
        self.records.get(usize::try_from(index).ok()?)
    }

    fn push(&mut self, record: StoredRecord, retention: usize) -> u64 {
        let offset = self.end();
        self.records.push_back(record);
        while self.records.len() > retention {
            self.records.pop_front();
            self.base += 1;
        }
        offset
    }
}

#[derive(Debug, Default)]
struct BrokerState {
    online: bool,
    /// topic -> partition -> records
    topics: HashMap<String, Vec<PartitionLog>>,
    /// (group, topic, partition) -> next offset to hand out
    offsets: HashMap<(String, String, u32), u64>,
}

impl BrokerState {
    fn partitions_mut(&mut self, topic: &str, count: u32) -> &mut Vec<PartitionLog> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| vec![PartitionLog::default(); count as usize])
    }
}

struct BrokerInner {
    partitions: u32,
    retention: usize,
    state: Mutex<BrokerState>,
    /// Woken on every append and on consumer disconnect.
    appended: Notify,
    records_appended: AtomicU64,
}

impl BrokerInner {
    fn append(
        &self,
        topic: &str,
        key: Option<String>,
        value: Option<Vec<u8>>,
        timestamp: i64,
    ) -> RecordMetadata {
        let partition = key
            .as_deref()
            .map_or(0, |k| partition_for(k, self.partitions));

        let metadata = {
            let mut state = self.state.lock();
            let log = &mut state.partitions_mut(topic, self.partitions)[partition as usize];
            let offset = log.push(
                StoredRecord {
                    key,
                    value,
                    timestamp,
                },
                self.retention,
            );
            RecordMetadata { partition, offset }
        };

        self.records_appended.fetch_add(1, Ordering::Relaxed);
        self.appended.notify_waiters();
        metadata
    }

    fn is_online(&self) -> bool {
        self.state.lock().online
    }
}

fn partition_for(key: &str, partitions: u32) -> u32 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % u64::from(partitions.max(1))) as u32
}

/// In-process broker shared by every client created from it.
///
/// Memory is bounded by the per-partition retention; a long-running process
/// keeps at most `retention` records per partition.
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryBroker {
    /// Create an online broker with one partition per topic.
    #[must_use]
    pub fn new() -> Self {
        Self::with_partitions(DEFAULT_PARTITIONS)
    }

    /// Create an online broker with `partitions` partitions per topic.
    #[must_use]
    pub fn with_partitions(partitions: u32) -> Self {
        Self::with_limits(partitions, DEFAULT_RETENTION)
    }

    /// Create an online broker keeping at most `retention` records per partition.
    #[must_use]
    pub fn with_limits(partitions: u32, retention: usize) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                partitions: partitions.max(1),
                retention: retention.max(1),
                state: Mutex::new(BrokerState {
                    online: true,
                    ..BrokerState::default()
                }),
                appended: Notify::new(),
                records_appended: AtomicU64::new(0),
            }),
        }
    }

    /// Take the broker down or bring it back.
    ///
    /// While offline, `connect`, `send` and `subscribe` fail with
    /// `TransportError::Unreachable`. Already connected consumers keep
    /// draining stored records.
    pub fn set_online(&self, online: bool) {
        self.inner.state.lock().online = online;
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.inner.is_online()
    }

    /// Append a record bypassing any producer, e.g. an empty or non-JSON body.
    pub fn inject_raw(
        &self,
        topic: &str,
        key: Option<&str>,
        value: Option<Vec<u8>>,
    ) -> RecordMetadata {
        self.inner
            .append(topic, key.map(ToString::to_string), value, now_millis())
    }

    /// All records still retained for `topic`, partition by partition.
    #[must_use]
    pub fn records(&self, topic: &str) -> Vec<RawMessage> {
        let state = self.inner.state.lock();
        let Some(partitions) = state.topics.get(topic) else {
            return Vec::new();
        };

        partitions
            .iter()
            .enumerate()
            .flat_map(|(partition, log)| {
                let base = log.base;
                log.records.iter().enumerate().map(move |(index, record)| RawMessage {
                    topic: topic.to_string(),
                    partition: partition as u32,
                    offset: base + index as u64,
                    key: record.key.clone(),
                    value: record.value.clone(),
                    timestamp: record.timestamp,
                })
            })
            .collect()
    }

    /// Names of every topic created so far.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.state.lock().topics.keys().cloned().collect();
        names.sort();
        names
    }

    /// Partitions per topic.
    #[must_use]
    pub fn partitions(&self) -> u32 {
        self.inner.partitions
    }

    /// Records kept per partition.
    #[must_use]
    pub fn retention(&self) -> usize {
        self.inner.retention
    }

    /// Total records appended across all topics.
    #[must_use]
    pub fn records_appended(&self) -> u64 {
        self.inner.records_appended.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for InMemoryBroker {
    fn producer(&self, config: &BusConfig) -> Arc<dyn Producer> {
        Arc::new(InMemoryProducer {
            broker: Arc::clone(&self.inner),
            brokers: config.brokers_display(),
            connected: AtomicBool::new(false),
        })
    }

    fn consumer(&self, config: &BusConfig) -> Arc<dyn Consumer> {
        Arc::new(InMemoryConsumer {
            broker: Arc::clone(&self.inner),
            brokers: config.brokers_display(),
            group_id: config.group_id.clone(),
            state: Mutex::new(ConsumerState::default()),
        })
    }
}

/// Producer handle onto an [`InMemoryBroker`].
pub struct InMemoryProducer {
    broker: Arc<BrokerInner>,
    brokers: String,
    connected: AtomicBool,
}

impl InMemoryProducer {
    fn unreachable(&self) -> TransportError {
        TransportError::Unreachable {
            brokers: self.brokers.clone(),
        }
    }
}

#[async_trait]
impl Producer for InMemoryProducer {
    async fn connect(&self) -> Result<(), TransportError> {
        if !self.broker.is_online() {
            return Err(self.unreachable());
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, topic: &str, envelope: Envelope) -> Result<RecordMetadata, TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected { handle: "producer" });
        }
        if !self.broker.is_online() {
            return Err(self.unreachable());
        }
        if topic.is_empty() {
            return Err(TransportError::UnknownTopic(String::new()));
        }

        let metadata = self.broker.append(
            topic,
            Some(envelope.key),
            Some(envelope.payload),
            envelope.timestamp,
        );
        debug!(
            topic = %topic,
            partition = metadata.partition,
            offset = metadata.offset,
            "Record appended"
        );
        Ok(metadata)
    }
}

#[derive(Debug, Default)]
struct ConsumerState {
    connected: bool,
    topics: Vec<String>,
    /// Index of the topic to poll first, rotated for fairness.
    cursor: usize,
}

/// Consumer handle onto an [`InMemoryBroker`], bound to one group.
pub struct InMemoryConsumer {
    broker: Arc<BrokerInner>,
    brokers: String,
    group_id: String,
    state: Mutex<ConsumerState>,
}

impl InMemoryConsumer {
    /// Hand out the next unread record for this group, rotating across topics.
    fn take_next(&self, consumer: &mut ConsumerState) -> Option<RawMessage> {
        let count = consumer.topics.len();
        let mut broker = self.broker.state.lock();
        let state = &mut *broker;

        for step in 0..count {
            let index = (consumer.cursor + step) % count;
            let topic = &consumer.topics[index];
            let Some(partitions) = state.topics.get(topic) else {
                continue;
            };

            for (partition, log) in partitions.iter().enumerate() {
                let offset_key = (self.group_id.clone(), topic.clone(), partition as u32);
                let mut offset = state.offsets.get(&offset_key).copied().unwrap_or(0);
                if offset < log.base {
                    warn!(
                        group_id = %self.group_id,
                        topic = %topic,
                        partition,
                        skipped = log.base - offset,
                        "Records evicted before this group read them"
                    );
                    offset = log.base;
                }
                let Some(record) = log.get(offset) else {
                    continue;
                };

                let message = RawMessage {
                    topic: topic.clone(),
                    partition: partition as u32,
                    offset,
                    key: record.key.clone(),
                    value: record.value.clone(),
                    timestamp: record.timestamp,
                };
                state.offsets.insert(offset_key, offset + 1);
                consumer.cursor = (index + 1) % count;
                return Some(message);
            }
        }
        None
    }
}

#[async_trait]
impl Consumer for InMemoryConsumer {
    async fn connect(&self) -> Result<(), TransportError> {
        if !self.broker.is_online() {
            return Err(TransportError::Unreachable {
                brokers: self.brokers.clone(),
            });
        }
        self.state.lock().connected = true;
        debug!(group_id = %self.group_id, "Consumer joined group");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.state.lock().connected = false;
        // Release a consumer parked in `next_message`.
        self.broker.appended.notify_waiters();
        Ok(())
    }

    async fn subscribe(&self, topic: &str, from_beginning: bool) -> Result<(), TransportError> {
        {
            let mut consumer = self.state.lock();
            if !consumer.connected {
                return Err(TransportError::NotConnected { handle: "consumer" });
            }

            let mut broker = self.broker.state.lock();
            if !broker.online {
                return Err(TransportError::Unreachable {
                    brokers: self.brokers.clone(),
                });
            }

            let bounds: Vec<(u64, u64)> = broker
                .partitions_mut(topic, self.broker.partitions)
                .iter()
                .map(|log| (log.base, log.end()))
                .collect();
            for (partition, (base, end)) in bounds.into_iter().enumerate() {
                let start = if from_beginning { base } else { end };
                broker
                    .offsets
                    .entry((self.group_id.clone(), topic.to_string(), partition as u32))
                    .or_insert(start);
            }

            if !consumer.topics.iter().any(|t| t == topic) {
                consumer.topics.push(topic.to_string());
            }
        }

        // A loop already parked in `next_message` must see the new topic's history.
        self.broker.appended.notify_waiters();
        Ok(())
    }

    async fn next_message(&self) -> Result<Option<RawMessage>, TransportError> {
        loop {
            // Register interest before checking so an append between the
            // check and the await is not missed.
            let notified = self.broker.appended.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut consumer = self.state.lock();
                if !consumer.connected {
                    return Ok(None);
                }
                if let Some(message) = self.take_next(&mut consumer) {
                    return Ok(Some(message));
                }
            }

            notified.await;
        }
    }
}
