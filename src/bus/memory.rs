//! In-process bus broker
//!
//! Routes mailbox and stream traffic between clients living in the same
//! process. Each client owns a bounded queue; a full queue makes mailbox
//! sends wait (up to their timeout) and makes stream publishes skip that
//! subscriber.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::mpsc;

use super::{BusClient, BusConnector, Delivery, DeliveryKind};
use crate::{Error, Result};

/// Default per-client queue depth
const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// In-memory broker bound to a single endpoint
#[derive(Clone)]
pub struct InProcessBroker {
    inner: Arc<BrokerInner>,
}

struct BrokerInner {
    endpoint: String,
    capacity: usize,
    state: Mutex<BrokerState>,
}

#[derive(Default)]
struct BrokerState {
    next_id: u64,
    clients: HashMap<String, ClientEntry>,
}

struct ClientEntry {
    id: u64,
    tx: mpsc::Sender<Delivery>,
    producer: Option<String>,
    subscriptions: Vec<Subscription>,
}

struct Subscription {
    stream: String,
    pattern: Regex,
}

impl InProcessBroker {
    /// Bind a broker to `endpoint`
    #[must_use]
    pub fn bind(endpoint: impl Into<String>) -> Self {
        Self::with_capacity(endpoint, DEFAULT_QUEUE_CAPACITY)
    }

    /// Bind a broker whose client queues hold at most `capacity` deliveries
    #[must_use]
    pub fn with_capacity(endpoint: impl Into<String>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                endpoint: endpoint.into(),
                capacity: capacity.max(1),
                state: Mutex::new(BrokerState::default()),
            }),
        }
    }

    /// Endpoint this broker is bound to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Whether a client is connected under `address`
    #[must_use]
    pub fn is_connected(&self, address: &str) -> bool {
        self.inner
            .state
            .lock()
            .map(|state| state.clients.contains_key(address))
            .unwrap_or(false)
    }
}

impl BrokerInner {
    fn state(&self) -> Result<MutexGuard<'_, BrokerState>> {
        self.state
            .lock()
            .map_err(|_| Error::Bus("broker state poisoned".to_string()))
    }
}

#[async_trait]
impl BusConnector for InProcessBroker {
    async fn connect(
        &self,
        endpoint: &str,
        address: &str,
        _timeout: Duration,
    ) -> Result<Box<dyn BusClient>> {
        if endpoint != self.inner.endpoint {
            return Err(Error::Bus(format!("no broker bound at {endpoint}")));
        }

        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let id = {
            let mut state = self.inner.state()?;
            state.next_id += 1;
            let id = state.next_id;
            let previous = state.clients.insert(
                address.to_string(),
                ClientEntry {
                    id,
                    tx,
                    producer: None,
                    subscriptions: Vec::new(),
                },
            );
            if previous.is_some() {
                tracing::warn!(address, "replacing existing client with the same address");
            }
            id
        };

        tracing::debug!(endpoint, address, "client connected");

        Ok(Box::new(MemoryClient {
            id,
            address: address.to_string(),
            broker: Arc::clone(&self.inner),
            rx,
        }))
    }
}

/// Client side of an in-process connection
struct MemoryClient {
    id: u64,
    address: String,
    broker: Arc<BrokerInner>,
    rx: mpsc::Receiver<Delivery>,
}

impl MemoryClient {
    fn with_entry<T>(&self, f: impl FnOnce(&mut ClientEntry) -> T) -> Result<T> {
        let mut state = self.broker.state()?;
        match state.clients.get_mut(&self.address) {
            Some(entry) if entry.id == self.id => Ok(f(entry)),
            _ => Err(Error::Bus(format!("client {} is disconnected", self.address))),
        }
    }
}

#[async_trait]
impl BusClient for MemoryClient {
    fn address(&self) -> &str {
        &self.address
    }

    async fn set_producer(&mut self, stream: &str) -> Result<()> {
        self.with_entry(|entry| entry.producer = Some(stream.to_string()))
    }

    async fn set_consumer(&mut self, stream: &str, pattern: &str) -> Result<()> {
        let pattern = Regex::new(&format!("^(?:{pattern})$"))?;
        self.with_entry(|entry| {
            entry.subscriptions.push(Subscription {
                stream: stream.to_string(),
                pattern,
            });
        })
    }

    async fn send_to(
        &self,
        address: &str,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<()> {
        let tx = {
            let state = self.broker.state()?;
            state
                .clients
                .get(address)
                .map(|entry| entry.tx.clone())
                .ok_or_else(|| Error::Bus(format!("unknown mailbox address: {address}")))?
        };

        let delivery = Delivery {
            kind: DeliveryKind::Mailbox,
            sender: self.address.clone(),
            subject: subject.to_string(),
            stream: None,
            payload,
        };

        match tokio::time::timeout(timeout, tx.send(delivery)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(Error::Bus(format!("mailbox {address} is closed"))),
            Err(_) => Err(Error::Timeout(
                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        let (stream, targets) = {
            let state = self.broker.state()?;
            let stream = state
                .clients
                .get(&self.address)
                .filter(|entry| entry.id == self.id)
                .and_then(|entry| entry.producer.clone())
                .ok_or_else(|| Error::Bus(format!("{} is not a stream producer", self.address)))?;

            let targets: Vec<_> = state
                .clients
                .values()
                .filter(|entry| {
                    entry
                        .subscriptions
                        .iter()
                        .any(|sub| sub.stream == stream && sub.pattern.is_match(subject))
                })
                .map(|entry| entry.tx.clone())
                .collect();
            (stream, targets)
        };

        for tx in targets {
            let delivery = Delivery {
                kind: DeliveryKind::Stream,
                sender: self.address.clone(),
                subject: subject.to_string(),
                stream: Some(stream.clone()),
                payload: payload.clone(),
            };
            if let Err(e) = tx.try_send(delivery) {
                tracing::warn!(stream = %stream, subject, error = %e, "dropping stream delivery");
            }
        }

        Ok(())
    }

    async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }
}

impl Drop for MemoryClient {
    fn drop(&mut self) {
        let Ok(mut state) = self.broker.state.lock() else {
            return;
        };
        if state
            .clients
            .get(&self.address)
            .is_some_and(|entry| entry.id == self.id)
        {
            state.clients.remove(&self.address);
            tracing::debug!(address = %self.address, "client disconnected");
        }
    }
}
