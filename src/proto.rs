//! Wire codec for bus payloads
//!
//! Every payload carries exactly one message: a device record, an
//! acknowledgement, or a structured error. Payloads are JSON objects tagged
//! by `kind`. Decoding always produces an owned value, so a decoded message
//! outlives the buffer it was read from.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::devices::DeviceRecord;

/// Conventional stream on which device announcements are published
pub const DEVICE_STREAM: &str = "DEVICES";

/// Request payload was not a device record
pub const BAD_REQUEST: u16 = 400;

/// Mailbox subject is not handled
pub const SUBJECT_NOT_FOUND: u16 = 403;

/// Requested device is not in the registry
pub const NOT_FOUND: u16 = 404;

/// Message kind, used for logging and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Device,
    Ok,
    Error,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device => write!(f, "DEVICE"),
            Self::Ok => write!(f, "OK"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A decoded bus message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtoMessage {
    /// Device record
    Device(DeviceRecord),
    /// Acknowledgement
    Ok,
    /// Structured failure
    Error { code: u16, reason: String },
}

impl ProtoMessage {
    /// Build an error message
    #[must_use]
    pub fn error(code: u16, reason: impl Into<String>) -> Self {
        Self::Error {
            code,
            reason: reason.into(),
        }
    }

    /// Reply for a lookup miss
    #[must_use]
    pub fn device_not_found() -> Self {
        Self::error(NOT_FOUND, "Requested device does not exists")
    }

    /// Reply for an unhandled mailbox subject
    #[must_use]
    pub fn subject_not_found() -> Self {
        Self::error(SUBJECT_NOT_FOUND, "Subject not found")
    }

    /// Reply for a request whose payload is not a device record
    #[must_use]
    pub fn not_a_device() -> Self {
        Self::error(BAD_REQUEST, "Request is not a DEVICE message")
    }

    /// Kind of this message
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Device(_) => MessageKind::Device,
            Self::Ok => MessageKind::Ok,
            Self::Error { .. } => MessageKind::Error,
        }
    }

    /// Device record carried by this message, if any
    #[must_use]
    pub const fn device(&self) -> Option<&DeviceRecord> {
        match self {
            Self::Device(record) => Some(record),
            _ => None,
        }
    }

    /// Encode into a payload
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a payload
    ///
    /// # Errors
    ///
    /// Returns error if the payload is not a valid message
    pub fn decode(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}

impl From<DeviceRecord> for ProtoMessage {
    fn from(record: DeviceRecord) -> Self {
        Self::Device(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_wire_shape() {
        let message = ProtoMessage::from(DeviceRecord::new("device1", 1000, 1024).with_aux("a", "b"));
        let value: serde_json::Value = serde_json::from_slice(&message.encode().unwrap()).unwrap();

        assert_eq!(value["kind"], "DEVICE");
        assert_eq!(value["identifier"], "device1");
        assert_eq!(value["timestamp"], 1000);
        assert_eq!(value["ttl"], 1024);
        assert_eq!(value["aux"]["a"], "b");
    }

    #[test]
    fn decodes_ok_and_error() {
        assert_eq!(ProtoMessage::decode(br#"{"kind":"OK"}"#).unwrap(), ProtoMessage::Ok);

        let error = ProtoMessage::decode(br#"{"kind":"ERROR","code":404,"reason":"gone"}"#).unwrap();
        assert_eq!(error, ProtoMessage::error(404, "gone"));
        assert_eq!(error.kind(), MessageKind::Error);
    }

    #[test]
    fn device_without_aux_decodes() {
        let message =
            ProtoMessage::decode(br#"{"kind":"DEVICE","identifier":"d","timestamp":1,"ttl":2}"#)
                .unwrap();
        let device = message.device().unwrap();
        assert_eq!(device.identifier, "d");
        assert!(device.aux.is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert!(ProtoMessage::decode(b"\x00\x01garbage").is_err());
        assert!(ProtoMessage::decode(br#"{"kind":"PING"}"#).is_err());
    }

    #[test]
    fn canned_errors() {
        assert_eq!(
            ProtoMessage::device_not_found(),
            ProtoMessage::error(404, "Requested device does not exists")
        );
        assert_eq!(
            ProtoMessage::subject_not_found(),
            ProtoMessage::error(403, "Subject not found")
        );
    }

    #[test]
    fn rejects_timestamp_outside_integer_range() {
        let payload =
            br#"{"kind":"DEVICE","identifier":"d","timestamp":9300000000000000000,"ttl":1}"#;
        assert!(ProtoMessage::decode(payload).is_err());
    }
}
