//! Message bus transport boundary
//!
//! The actor talks to the bus only through `BusConnector` and `BusClient`.
//! Two delivery classes exist: mailbox (addressed request/response) and
//! stream (pattern-subscribed broadcast).

mod memory;

use std::time::Duration;

use async_trait::async_trait;

pub use memory::InProcessBroker;

use crate::Result;

/// Transport-level delivery class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    /// Point-to-point message addressed to this client
    Mailbox,
    /// Broadcast message received through a stream subscription
    Stream,
}

impl std::fmt::Display for DeliveryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mailbox => write!(f, "mailbox"),
            Self::Stream => write!(f, "stream"),
        }
    }
}

/// A message received from the bus
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Delivery class
    pub kind: DeliveryKind,

    /// Address of the sending client
    pub sender: String,

    /// Message subject
    pub subject: String,

    /// Stream name (stream deliveries only)
    pub stream: Option<String>,

    /// Encoded payload
    pub payload: Vec<u8>,
}

/// Opens bus connections
#[async_trait]
pub trait BusConnector: Send + Sync {
    /// Connect to `endpoint` under the mailbox `address`
    async fn connect(
        &self,
        endpoint: &str,
        address: &str,
        timeout: Duration,
    ) -> Result<Box<dyn BusClient>>;
}

/// An established bus connection
///
/// Dropping the client closes the connection.
#[async_trait]
pub trait BusClient: Send + Sync {
    /// Mailbox address of this client
    fn address(&self) -> &str;

    /// Register as the publisher of `stream`
    async fn set_producer(&mut self, stream: &str) -> Result<()>;

    /// Subscribe to messages on `stream` whose subject matches `pattern`
    async fn set_consumer(&mut self, stream: &str, pattern: &str) -> Result<()>;

    /// Send a mailbox message, waiting at most `timeout` for delivery
    async fn send_to(
        &self,
        address: &str,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<()>;

    /// Publish on the registered producer stream
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()>;

    /// Receive the next delivery; `None` once the connection is closed
    ///
    /// Must be cancel-safe: it is polled inside `tokio::select!`.
    async fn recv(&mut self) -> Option<Delivery>;
}
