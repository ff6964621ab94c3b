//! Asset actor
//!
//! A single task owns the device registry, the bus connection and the active
//! configuration. It waits on exactly two sources, the control channel and
//! the bus connection, and handles whichever becomes ready. There is no
//! periodic tick.
//!
//! ```text
//!   owner ──control──▶ ┌─────────────┐ ◀──mailbox/stream── bus
//!                      │ AssetActor  │
//!                      │  registry   │ ──reply (LOOKUP)──▶ bus
//!                      └─────────────┘
//! ```

pub mod dispatch;
mod handle;
pub mod state;

use std::sync::Arc;

use tokio::sync::mpsc;

pub use handle::{AssetHandle, ControlRequest};
pub use state::{ActorState, Command};

use crate::bus::{BusClient, BusConnector, Delivery, DeliveryKind};
use crate::config::{AssetConfig, DEFAULT_SEND_TIMEOUT};
use crate::devices::DeviceRegistry;
use crate::proto::ProtoMessage;
use crate::{Error, Result};

/// Control channel depth
const CONTROL_CAPACITY: usize = 16;

/// The asset actor's owned state
pub struct AssetActor {
    state: ActorState,
    verbose: bool,
    config: Option<AssetConfig>,
    registry: DeviceRegistry,
    connector: Arc<dyn BusConnector>,
    bus: Option<Box<dyn BusClient>>,
    control: mpsc::Receiver<ControlRequest>,
}

impl AssetActor {
    /// Spawn an actor on the current runtime and return its control handle
    #[must_use]
    pub fn spawn(connector: Arc<dyn BusConnector>) -> AssetHandle {
        let (tx, rx) = mpsc::channel(CONTROL_CAPACITY);
        let actor = Self::new(connector, rx);
        let task = tokio::spawn(actor.run());
        AssetHandle::new(tx, task)
    }

    fn new(connector: Arc<dyn BusConnector>, control: mpsc::Receiver<ControlRequest>) -> Self {
        Self {
            state: ActorState::Created,
            verbose: false,
            config: None,
            registry: DeviceRegistry::new(),
            connector,
            bus: None,
            control,
        }
    }

    /// Run until `$TERM` or until every handle is dropped
    pub async fn run(mut self) {
        tracing::debug!("asset actor started");

        while self.state != ActorState::Terminated {
            tokio::select! {
                request = self.control.recv() => {
                    if let Some(ControlRequest { frames, reply }) = request {
                        let result = self.handle_frames(frames).await;
                        // The owner may have stopped waiting
                        let _ = reply.send(result);
                    } else {
                        tracing::debug!("control channel closed, terminating");
                        self.state = ActorState::Terminated;
                    }
                }
                delivery = next_delivery(&mut self.bus), if self.bus.is_some() => {
                    if let Some(delivery) = delivery {
                        self.dispatch(delivery).await;
                    } else {
                        tracing::warn!("bus connection closed");
                        self.bus = None;
                        self.state = self.state.disconnected();
                    }
                }
            }
        }

        self.shutdown();
    }

    async fn handle_frames(&mut self, frames: Vec<String>) -> Result<()> {
        let command = Command::parse(frames).inspect_err(|e| {
            tracing::error!(error = %e, "rejected control command");
        })?;
        self.handle_command(command).await
    }

    async fn handle_command(&mut self, command: Command) -> Result<()> {
        if self.verbose {
            tracing::info!(command = command.name(), state = %self.state, "control command");
        }

        let result = match &command {
            Command::Config(text) => self.configure(text),
            Command::Start => self.start().await,
            Command::Stop => self.stop(),
            Command::Verbose => {
                self.verbose = !self.verbose;
                tracing::info!(verbose = self.verbose, "verbose diagnostics toggled");
                Ok(())
            }
            Command::Terminate => Ok(()),
        };

        if let Err(e) = &result {
            tracing::warn!(command = command.name(), error = %e, "command failed");
        }

        let next = self.state.next(&command, result.is_ok())?;
        if next != self.state {
            tracing::info!(from = %self.state, to = %next, "state transition");
            self.state = next;
        }
        result
    }

    /// Adopt a new configuration snapshot
    ///
    /// When the snapshot points at a different persistence file, the fresh
    /// registry is loaded first and the current one stored second; either
    /// failing leaves snapshot and registry untouched.
    fn configure(&mut self, text: &str) -> Result<()> {
        let config = AssetConfig::parse(text).inspect_err(|e| {
            tracing::warn!(error = %e, "can't load configuration");
        })?;

        let switch_to = config
            .persistence_file()
            .filter(|path| self.registry.persistence_file() != Some(*path));

        if let Some(path) = switch_to {
            let fresh = DeviceRegistry::load(path)?;
            self.registry.store()?;
            tracing::info!(
                from = ?self.registry.persistence_file(),
                to = %path.display(),
                devices = fresh.len(),
                "switched persistence file"
            );
            self.registry = fresh;
        }

        if config.verbose() {
            self.verbose = true;
        }
        self.config = Some(config);
        Ok(())
    }

    /// Connect to the bus and register producer and consumers
    ///
    /// Any existing connection is dropped first. On failure the partially
    /// built connection is discarded and the actor stays disconnected.
    async fn start(&mut self) -> Result<()> {
        let Some(config) = &self.config else {
            return Err(Error::Config(
                "no configuration provided, there is nothing to do".to_string(),
            ));
        };
        let endpoint = config
            .endpoint()
            .ok_or_else(|| Error::Config("bus endpoint is missing".to_string()))?;
        let address = config
            .address()
            .ok_or_else(|| Error::Config("bus address is missing".to_string()))?;

        self.bus = None;

        let mut client = self
            .connector
            .connect(endpoint, address, config.connect_timeout())
            .await
            .inspect_err(|e| tracing::warn!(endpoint, error = %e, "can't connect to bus"))?;

        if let Some(stream) = config.producer() {
            client
                .set_producer(stream)
                .await
                .inspect_err(|e| tracing::warn!(stream, error = %e, "can't set up publisher"))?;
        }

        for consumer in config.consumers() {
            client
                .set_consumer(&consumer.stream, &consumer.pattern)
                .await
                .inspect_err(|e| {
                    tracing::warn!(
                        stream = %consumer.stream,
                        pattern = %consumer.pattern,
                        error = %e,
                        "can't set up consumer"
                    );
                })?;
        }

        tracing::info!(endpoint, address, "connected to bus");
        self.bus = Some(client);
        Ok(())
    }

    /// Disconnect from the bus and persist the registry
    fn stop(&mut self) -> Result<()> {
        if self.bus.take().is_some() {
            tracing::info!("disconnected from bus");
        }
        self.registry.store()
    }

    async fn dispatch(&mut self, delivery: Delivery) {
        let message = match ProtoMessage::decode(&delivery.payload) {
            Ok(message) => message,
            Err(e) => {
                if self.verbose {
                    tracing::warn!(
                        sender = %delivery.sender,
                        subject = %delivery.subject,
                        error = %e,
                        "can't read message"
                    );
                }
                return;
            }
        };

        match delivery.kind {
            DeliveryKind::Mailbox => {
                let reply = dispatch::handle_mailbox(&mut self.registry, &delivery.subject, message);
                self.send_reply(&delivery.sender, &reply).await;
            }
            DeliveryKind::Stream => dispatch::handle_stream(&delivery, &message, self.verbose),
        }
    }

    /// Send a reply once, within the configured timeout; failures are logged
    async fn send_reply(&self, recipient: &str, reply: &ProtoMessage) {
        let Some(bus) = &self.bus else {
            return;
        };
        let timeout = self
            .config
            .as_ref()
            .map_or(DEFAULT_SEND_TIMEOUT, AssetConfig::send_timeout);

        let result = match reply.encode() {
            Ok(payload) => {
                bus.send_to(recipient, dispatch::REPLY_SUBJECT, payload, timeout)
                    .await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(recipient, kind = %reply.kind(), error = %e, "failed to send reply");
        }
    }

    fn shutdown(mut self) {
        if let Err(e) = self.registry.store() {
            tracing::error!(error = %e, "failed to store devices on shutdown");
        }
        self.bus = None;
        tracing::info!(devices = self.registry.len(), "asset actor terminated");
    }
}

async fn next_delivery(bus: &mut Option<Box<dyn BusClient>>) -> Option<Delivery> {
    match bus {
        Some(client) => client.recv().await,
        None => std::future::pending().await,
    }
}
