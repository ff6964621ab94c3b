//! Device registry with file persistence

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::types::{DeviceRecord, PersistedDevice};
use crate::Result;

/// Authoritative set of known devices, keyed by identifier
///
/// The registry is owned by a single task and carries no locks. Records are
/// taken by value on insert, so stored entries never share memory with a
/// caller's receive buffer.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, DeviceRecord>,
    file: Option<PathBuf>,
}

impl DeviceRegistry {
    /// Create an empty registry with no persistence file
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from a persistence file and bind it to that path
    ///
    /// A missing file yields an empty registry bound to `path`, so the first
    /// `store` creates it.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "persistence file not found, starting empty");
            return Ok(Self {
                devices: HashMap::new(),
                file: Some(path),
            });
        }

        let content = std::fs::read_to_string(&path).inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to read persistence file");
        })?;
        let persisted: BTreeMap<String, PersistedDevice> =
            toml::from_str(&content).inspect_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "failed to parse persistence file");
            })?;

        let devices = persisted
            .into_iter()
            .map(|(identifier, device)| (identifier.clone(), device.into_record(identifier)))
            .collect::<HashMap<_, _>>();

        tracing::info!(path = %path.display(), count = devices.len(), "loaded devices");

        Ok(Self {
            devices,
            file: Some(path),
        })
    }

    /// Insert or fully replace the record under its identifier
    pub fn insert(&mut self, record: DeviceRecord) {
        self.devices.insert(record.identifier.clone(), record);
    }

    /// Remove a record, returning it if it was present
    pub fn delete(&mut self, identifier: &str) -> Option<DeviceRecord> {
        self.devices.remove(identifier)
    }

    /// Look up a record by identifier
    #[must_use]
    pub fn lookup(&self, identifier: &str) -> Option<&DeviceRecord> {
        self.devices.get(identifier)
    }

    /// Associate the registry with a persistence file (does not load)
    pub fn set_persistence_file(&mut self, path: impl Into<PathBuf>) {
        self.file = Some(path.into());
    }

    /// Current persistence file, if any
    #[must_use]
    pub fn persistence_file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Write every record to the persistence file, overwriting it
    ///
    /// No-op when no file is associated.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails
    pub fn store(&self) -> Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };

        let persisted: BTreeMap<&str, PersistedDevice> = self
            .devices
            .iter()
            .map(|(identifier, record)| (identifier.as_str(), PersistedDevice::from(record)))
            .collect();
        let content = toml::to_string(&persisted)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), count = self.devices.len(), "stored devices");
        Ok(())
    }

    /// Iterate over all records in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.values()
    }

    /// Number of known devices
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
