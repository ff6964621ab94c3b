//! Configuration snapshots for the asset actor
//!
//! A snapshot is parsed once and never edited. Reconfiguration parses a new
//! snapshot and swaps it in whole.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use self::file::AssetConfigFile;
use crate::Result;

/// Default reply send timeout
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default bus connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// A (stream, subscription pattern) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerSpec {
    /// Stream name
    pub stream: String,
    /// Regex matched against message subjects
    pub pattern: String,
}

/// Immutable, resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    endpoint: Option<String>,
    address: Option<String>,
    producer: Option<String>,
    consumers: Vec<ConsumerSpec>,
    persistence_file: Option<PathBuf>,
    send_timeout: Duration,
    connect_timeout: Duration,
    verbose: bool,
}

impl AssetConfig {
    /// Parse configuration text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid configuration TOML
    pub fn parse(text: &str) -> Result<Self> {
        let raw: AssetConfigFile = toml::from_str(text)?;

        let consumers = raw
            .bus
            .consumer
            .into_iter()
            .map(|(stream, pattern)| ConsumerSpec { stream, pattern })
            .collect();

        Ok(Self {
            endpoint: raw.bus.endpoint.filter(|s| !s.is_empty()),
            address: raw.bus.address.filter(|s| !s.is_empty()),
            producer: raw.bus.producer.filter(|s| !s.is_empty()),
            consumers,
            persistence_file: raw.server.file.filter(|p| !p.as_os_str().is_empty()),
            send_timeout: raw
                .bus
                .send_timeout_ms
                .map_or(DEFAULT_SEND_TIMEOUT, Duration::from_millis),
            connect_timeout: raw
                .bus
                .connect_timeout_ms
                .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_millis),
            verbose: raw.server.verbose.unwrap_or(false),
        })
    }

    /// Broker endpoint
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Mailbox address of this client
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Outbound stream; publisher registration is skipped when unset
    #[must_use]
    pub fn producer(&self) -> Option<&str> {
        self.producer.as_deref()
    }

    /// Stream subscriptions in configuration order
    #[must_use]
    pub fn consumers(&self) -> &[ConsumerSpec] {
        &self.consumers
    }

    /// Device persistence file
    #[must_use]
    pub fn persistence_file(&self) -> Option<&Path> {
        self.persistence_file.as_deref()
    }

    /// Reply send timeout
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Bus connect timeout
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Whether verbose diagnostics were requested
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }
}
