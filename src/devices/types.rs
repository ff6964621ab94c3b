//! Device record types

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Process-wide origin for monotonic timestamps
static CLOCK_ORIGIN: OnceLock<Instant> = OnceLock::new();

/// Milliseconds elapsed on a monotonic clock since the first call in this process
#[must_use]
pub fn monotonic_millis() -> i64 {
    let origin = CLOCK_ORIGIN.get_or_init(Instant::now);
    i64::try_from(origin.elapsed().as_millis()).unwrap_or(i64::MAX)
}

/// A monitored device as known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Unique device identifier
    pub identifier: String,

    /// Last update time in milliseconds (monotonic clock)
    ///
    /// Signed so every value fits a TOML integer when persisted.
    pub timestamp: i64,

    /// Liveness value advertised by the producer
    pub ttl: u32,

    /// Extension properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aux: BTreeMap<String, String>,
}

impl DeviceRecord {
    /// Create a record with no extension properties
    #[must_use]
    pub fn new(identifier: impl Into<String>, timestamp: i64, ttl: u32) -> Self {
        Self {
            identifier: identifier.into(),
            timestamp,
            ttl,
            aux: BTreeMap::new(),
        }
    }

    /// Create a record stamped with the current monotonic time
    #[must_use]
    pub fn stamped(identifier: impl Into<String>, ttl: u32) -> Self {
        Self::new(identifier, monotonic_millis(), ttl)
    }

    /// Add an extension property
    #[must_use]
    pub fn with_aux(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.aux.insert(key.into(), value.into());
        self
    }
}

/// On-disk shape of a record; the identifier is the enclosing table name
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PersistedDevice {
    pub timestamp: i64,
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aux: BTreeMap<String, String>,
}

impl PersistedDevice {
    pub(crate) fn into_record(self, identifier: String) -> DeviceRecord {
        DeviceRecord {
            identifier,
            timestamp: self.timestamp,
            ttl: self.ttl,
            aux: self.aux,
        }
    }
}

impl From<&DeviceRecord> for PersistedDevice {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            ttl: record.ttl,
            aux: record.aux.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_back() {
        let first = monotonic_millis();
        let second = monotonic_millis();
        assert!(second >= first);
    }

    #[test]
    fn with_aux_accumulates() {
        let record = DeviceRecord::new("switch-1", 10, 60)
            .with_aux("rack", "4")
            .with_aux("vendor", "acme");

        assert_eq!(record.aux.len(), 2);
        assert_eq!(record.aux.get("rack").map(String::as_str), Some("4"));
    }
}
