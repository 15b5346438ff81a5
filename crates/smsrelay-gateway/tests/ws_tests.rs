// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket subscriber tests against a running gateway.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use smsrelay_bus::SubscriberRegistry;
use smsrelay_core::{MessageStatus, PluginAdapter};
use smsrelay_gateway::{GatewayServer, GatewayState, ServerConfig};
use smsrelay_test_utils::MemoryMessageStore;
use smsrelay_test_utils::fixtures::new_message;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;

async fn start_gateway() -> (GatewayServer, std::net::SocketAddr) {
    let state = GatewayState::new(
        Arc::new(MemoryMessageStore::new()),
        Arc::new(SubscriberRegistry::new(16)),
        10,
        "smsrelay",
        CancellationToken::new(),
    );
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let server = GatewayServer::new(config, state);
    let addr = server.start().await.unwrap();
    (server, addr)
}

async fn wait_for_subscribers(registry: &SubscriberRegistry, n: usize) {
    for _ in 0..100 {
        if registry.len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("subscriber never registered");
}

async fn next_json<S>(stream: &mut S) -> serde_json::Value
where
    S: futures::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let WsMessage::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn subscriber_receives_created_then_status_changed() {
    let (server, addr) = start_gateway().await;
    let (mut socket, _) = connect_async(format!("ws://{addr}/ws?label=dispatcher"))
        .await
        .unwrap();
    let state = server.state().clone();
    wait_for_subscribers(&state.registry, 1).await;

    let msg = state
        .lifecycle
        .create(new_message("+59178111111", "UNIA"))
        .await
        .unwrap();
    state
        .lifecycle
        .update_status(&msg.id, MessageStatus::Sent)
        .await
        .unwrap();

    let created = next_json(&mut socket).await;
    assert_eq!(created["event"], "created");
    assert_eq!(created["data"]["id"], msg.id.0.as_str());
    assert_eq!(created["data"]["status"], "PENDING");
    assert!(created["emittedAt"].as_str().unwrap().ends_with('Z'));

    let changed = next_json(&mut socket).await;
    assert_eq!(changed["event"], "status-changed");
    assert_eq!(changed["data"]["status"], "SENT");
    assert_ne!(created["id"], changed["id"]);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn closing_the_socket_unregisters_the_subscriber() {
    let (server, addr) = start_gateway().await;
    let (mut socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let registry = Arc::clone(&server.state().registry);
    wait_for_subscribers(&registry, 1).await;

    socket.close(None).await.unwrap();
    for _ in 0..100 {
        if registry.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(registry.is_empty());

    server.shutdown().await.unwrap();
}
