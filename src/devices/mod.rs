//! Device registry
//!
//! Devices are monitored entities announced by producers on the bus and
//! queried by peers through mailbox requests

pub mod registry;
pub mod types;

pub use registry::DeviceRegistry;
pub use types::{DeviceRecord, monotonic_millis};
