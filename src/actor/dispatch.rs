//! Bus message dispatch
//!
//! Mailbox requests are routed to registry operations and always produce a
//! reply. Stream deliveries are observed only.

use crate::bus::Delivery;
use crate::devices::DeviceRegistry;
use crate::proto::{MessageKind, ProtoMessage};

/// Insert or replace a device
pub const SUBJECT_INSERT: &str = "INSERT";

/// Remove a device
pub const SUBJECT_DELETE: &str = "DELETE";

/// Look up a device by identifier
pub const SUBJECT_LOOKUP: &str = "LOOKUP";

/// Subject used for every mailbox reply, whatever the request subject.
/// Peers match on it, so it stays `LOOKUP` for INSERT and DELETE too.
pub const REPLY_SUBJECT: &str = SUBJECT_LOOKUP;

/// Apply a mailbox request to the registry and build the reply
#[must_use]
pub fn handle_mailbox(
    registry: &mut DeviceRegistry,
    subject: &str,
    message: ProtoMessage,
) -> ProtoMessage {
    if !matches!(subject, SUBJECT_INSERT | SUBJECT_DELETE | SUBJECT_LOOKUP) {
        return ProtoMessage::subject_not_found();
    }

    let ProtoMessage::Device(record) = message else {
        return ProtoMessage::not_a_device();
    };

    match subject {
        SUBJECT_INSERT => {
            tracing::debug!(device = %record.identifier, ttl = record.ttl, "insert");
            registry.insert(record);
            ProtoMessage::Ok
        }
        SUBJECT_DELETE => {
            let removed = registry.delete(&record.identifier).is_some();
            tracing::debug!(device = %record.identifier, removed, "delete");
            ProtoMessage::Ok
        }
        _ => registry
            .lookup(&record.identifier)
            .cloned()
            .map_or_else(ProtoMessage::device_not_found, ProtoMessage::Device),
    }
}

/// Observe a stream delivery
///
/// Only device announcements are of interest; nothing is re-published.
pub fn handle_stream(delivery: &Delivery, message: &ProtoMessage, verbose: bool) {
    match message {
        ProtoMessage::Device(record) => {
            tracing::debug!(
                stream = delivery.stream.as_deref().unwrap_or_default(),
                sender = %delivery.sender,
                device = %record.identifier,
                "device announced on stream"
            );
        }
        other if verbose => {
            tracing::warn!(
                sender = %delivery.sender,
                subject = %delivery.subject,
                kind = %other.kind(),
                expected = %MessageKind::Device,
                "ignoring stream message that is not a device"
            );
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::DeviceRecord;

    fn device(identifier: &str, timestamp: i64, ttl: u32) -> ProtoMessage {
        DeviceRecord::new(identifier, timestamp, ttl).into()
    }

    #[test]
    fn insert_then_lookup() {
        let mut registry = DeviceRegistry::new();

        let reply = handle_mailbox(&mut registry, "INSERT", device("device1", 1000, 1024));
        assert_eq!(reply, ProtoMessage::Ok);

        let reply = handle_mailbox(&mut registry, "LOOKUP", device("device1", 0, 0));
        assert_eq!(reply, device("device1", 1000, 1024));
    }

    #[test]
    fn lookup_miss_is_404() {
        let mut registry = DeviceRegistry::new();
        let reply = handle_mailbox(&mut registry, "LOOKUP", device("ghost", 0, 0));
        assert_eq!(
            reply,
            ProtoMessage::error(404, "Requested device does not exists")
        );
    }

    #[test]
    fn delete_is_idempotent() {
        let mut registry = DeviceRegistry::new();
        assert_eq!(
            handle_mailbox(&mut registry, "INSERT", device("device1", 1, 1)),
            ProtoMessage::Ok
        );
        assert_eq!(
            handle_mailbox(&mut registry, "DELETE", device("device1", 0, 0)),
            ProtoMessage::Ok
        );
        assert_eq!(
            handle_mailbox(&mut registry, "DELETE", device("device1", 0, 0)),
            ProtoMessage::Ok
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_subject_is_403() {
        let mut registry = DeviceRegistry::new();
        let reply = handle_mailbox(&mut registry, "UPSERT", device("device1", 1, 1));

        assert_eq!(reply, ProtoMessage::error(403, "Subject not found"));
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_subject_wins_over_payload_kind() {
        let mut registry = DeviceRegistry::new();
        let reply = handle_mailbox(&mut registry, "PING", ProtoMessage::Ok);
        assert_eq!(reply, ProtoMessage::subject_not_found());
    }

    #[test]
    fn non_device_request_is_rejected() {
        let mut registry = DeviceRegistry::new();
        let reply = handle_mailbox(&mut registry, "INSERT", ProtoMessage::Ok);

        assert_eq!(reply, ProtoMessage::not_a_device());
        assert!(registry.is_empty());
    }
}
