//! TOML configuration schema
//!
//! Every field is optional at parse time; what a command needs is checked
//! when the command runs.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetConfigFile {
    /// Bus connection settings
    #[serde(default)]
    pub bus: BusFileConfig,

    /// Server/runtime settings
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Bus connection settings
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusFileConfig {
    /// Broker endpoint (e.g. "inproc://asset-registry")
    pub endpoint: Option<String>,

    /// Mailbox address of this client
    pub address: Option<String>,

    /// Outbound stream name
    pub producer: Option<String>,

    /// Stream name to subscription pattern, in document order
    #[serde(default)]
    pub consumer: IndexMap<String, String>,

    /// Reply send timeout in milliseconds
    pub send_timeout_ms: Option<u64>,

    /// Connect timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,
}

/// Server/runtime settings
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerFileConfig {
    /// Device persistence file
    pub file: Option<PathBuf>,

    /// Enable verbose diagnostics
    pub verbose: Option<bool>,
}

/// Read configuration text from a file
///
/// The text is returned unparsed so it can be handed to the actor as a
/// `CONFIG` command.
///
/// # Errors
///
/// Returns error if the file cannot be read
pub fn read_config_file(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).inspect_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "failed to read config file");
    })?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(content)
}
