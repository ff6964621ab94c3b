//! Shared test utilities

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use asset_registry::bus::{BusClient, BusConnector, Delivery, InProcessBroker};
use asset_registry::{AssetActor, AssetHandle, ProtoMessage};

pub const ENDPOINT: &str = "inproc://asset-registry-test";
pub const ASSET_ADDRESS: &str = "asset-registry";
pub const TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration text pointing at the test broker
#[must_use]
pub fn config_text(file: Option<&Path>) -> String {
    let mut text = format!(
        "[bus]\nendpoint = \"{ENDPOINT}\"\naddress = \"{ASSET_ADDRESS}\"\nproducer = \"ASSETS\"\n\n[bus.consumer]\nDEVICES = \".*\"\n"
    );
    if let Some(file) = file {
        text.push_str(&format!("\n[server]\nfile = \"{}\"\n", file.display()));
    }
    text
}

/// Spawn an actor, configure it and connect it to `broker`
pub async fn spawn_asset(broker: &InProcessBroker, file: Option<&Path>) -> AssetHandle {
    let actor = AssetActor::spawn(Arc::new(broker.clone()));
    actor
        .configure(&config_text(file))
        .await
        .expect("failed to configure actor");
    actor.start().await.expect("failed to start actor");
    actor
}

/// Connect a peer client to the test broker
pub async fn connect(broker: &InProcessBroker, address: &str) -> Box<dyn BusClient> {
    broker
        .connect(ENDPOINT, address, TIMEOUT)
        .await
        .expect("failed to connect peer")
}

/// Send a mailbox request to the asset actor and wait for the raw reply
pub async fn request_raw(
    client: &mut Box<dyn BusClient>,
    subject: &str,
    payload: Vec<u8>,
) -> Delivery {
    client
        .send_to(ASSET_ADDRESS, subject, payload, TIMEOUT)
        .await
        .expect("failed to send request");
    tokio::time::timeout(TIMEOUT, client.recv())
        .await
        .expect("timed out waiting for reply")
        .expect("connection closed")
}

/// Send a mailbox request to the asset actor and decode the reply
pub async fn request(
    client: &mut Box<dyn BusClient>,
    subject: &str,
    message: &ProtoMessage,
) -> ProtoMessage {
    let payload = message.encode().expect("failed to encode request");
    let reply = request_raw(client, subject, payload).await;
    assert_eq!(reply.subject, "LOOKUP");
    ProtoMessage::decode(&reply.payload).expect("failed to decode reply")
}

/// Assert that nothing arrives on `client` for a short while
pub async fn assert_silent(client: &mut Box<dyn BusClient>) {
    let received = tokio::time::timeout(Duration::from_millis(100), client.recv()).await;
    assert!(received.is_err(), "unexpected delivery: {received:?}");
}
