//! Error types for the asset registry

use thiserror::Error;

/// Result type alias for asset registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the asset registry
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing or invalid settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Bus transport error
    #[error("bus error: {0}")]
    Bus(String),

    /// A bus operation did not complete in time
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// Control command not recognised by the actor
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Control command recognised but malformed
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The actor has already terminated
    #[error("actor terminated")]
    Terminated,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wire codec error
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("toml serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Invalid stream subscription pattern
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
