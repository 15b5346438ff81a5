// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: SQLite store, running gateway, WebSocket subscriber.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use futures::StreamExt;
use serde_json::{Value, json};
use smsrelay_bus::SubscriberRegistry;
use smsrelay_config::model::StorageConfig;
use smsrelay_core::{MessageStore, PluginAdapter};
use smsrelay_gateway::{GatewayServer, GatewayState, ServerConfig};
use smsrelay_storage::SqliteMessageStore;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct Service {
    gateway: GatewayServer,
    store: Arc<SqliteMessageStore>,
    addr: std::net::SocketAddr,
    _dir: tempfile::TempDir,
}

async fn start_service() -> Service {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig {
        database_path: dir.path().join("smsrelay.db").display().to_string(),
        ..StorageConfig::default()
    };
    let store = Arc::new(SqliteMessageStore::new(storage));
    store.initialize().await.unwrap();

    let state = GatewayState::new(
        store.clone(),
        Arc::new(SubscriberRegistry::new(32)),
        10,
        "smsrelay",
        CancellationToken::new(),
    );
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let gateway = GatewayServer::new(config, state);
    let addr = gateway.start().await.unwrap();
    Service {
        gateway,
        store,
        addr,
        _dir: dir,
    }
}

async fn rest(service: &Service, request: Request<Body>) -> (StatusCode, Value) {
    let response = service.gateway.router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn wait_for_subscribers(service: &Service, n: usize) {
    for _ in 0..200 {
        if service.gateway.state().registry.len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("subscriber never registered");
}

async fn next_event<S>(socket: &mut S) -> Value
where
    S: futures::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(3), socket.next())
            .await
            .expect("timed out waiting for event")
            .expect("socket closed")
            .expect("websocket error");
        if let WsMessage::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn subscriber_sees_create_and_status_change_persisted_in_sqlite() {
    let service = start_service().await;
    let (mut socket, _) = connect_async(format!("ws://{}/ws?label=e2e", service.addr))
        .await
        .unwrap();
    wait_for_subscribers(&service, 1).await;

    let (status, body) = rest(
        &service,
        post(
            "/v1/sms/send-message",
            json!({
                "phone": "+59178111111",
                "message": "Your code is 4821",
                "app": "UNIA",
                "user": {"ci": "1234567", "nombreCompleto": "Ana Perez"},
                "messageType": "CODE"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = body["response"]["data"].clone();
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = rest(
        &service,
        post(
            "/v1/sms/send-message/status",
            json!({"messageId": id, "status": "SENT"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["data"]["status"], "SENT");

    let first = next_event(&mut socket).await;
    assert_eq!(first["event"], "created");
    assert_eq!(first["data"], created);

    let second = next_event(&mut socket).await;
    assert_eq!(second["event"], "status-changed");
    assert_eq!(second["data"]["id"], id.as_str());
    assert_eq!(second["data"]["status"], "SENT");

    let stored = service
        .store
        .find_by_id(&smsrelay_core::MessageId(id.clone()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, smsrelay_core::MessageStatus::Sent);
    assert_eq!(stored.chat_id.as_str(), created["chatId"].as_str().unwrap());

    service.gateway.shutdown().await.unwrap();
    service.store.shutdown().await.unwrap();
}

#[tokio::test]
async fn listing_reads_back_from_sqlite_newest_first() {
    let service = start_service().await;
    for (phone, app, kind) in [
        ("+59178111111", "UNIA", "CODE"),
        ("+59178111111", "UNIA", "INFO"),
        ("+59170000000", "Bank", "CODE"),
    ] {
        let (status, _) = rest(
            &service,
            post(
                "/v1/sms/send-message",
                json!({
                    "phone": phone,
                    "message": "hello",
                    "app": app,
                    "user": {"ci": "1"},
                    "messageType": kind
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let request = Request::get("/v1/sms/messages?phone=78111111")
        .body(Body::empty())
        .unwrap();
    let (status, body) = rest(&service, request).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["response"]["data"];
    assert_eq!(data["total"], 2);
    assert_eq!(data["items"][0]["messageType"], "INFO");
    assert_eq!(data["items"][1]["messageType"], "CODE");
    assert_eq!(data["items"][0]["chatId"], data["items"][1]["chatId"]);

    let unknown = Request::post("/v1/sms/send-message/status")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"messageId":"nope","status":"FAILED"}"#))
        .unwrap();
    let (status, _) = rest(&service, unknown).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    service.gateway.shutdown().await.unwrap();
}
