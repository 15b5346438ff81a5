// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket subscriber channel.
//!
//! Each connection is registered as a subscriber and receives every
//! lifecycle event as a JSON text frame:
//! ```json
//! {"id": "…", "event": "created", "emittedAt": "2026-01-01T00:00:00.000Z", "data": {…}}
//! ```
//! Anything the client sends is ignored except Close.

use axum::{
    extract::{
        Query, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::server::GatewayState;

/// Optional query parameters of GET /ws.
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Free-form name shown in logs.
    #[serde(default)]
    pub label: Option<String>,
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    Query(params): Query<WsParams>,
) -> Response {
    let label = params
        .label
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "ws".to_string());
    ws.on_upgrade(move |socket| handle_socket(socket, state, label))
}

async fn handle_socket(socket: WebSocket, state: GatewayState, label: String) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut subscription = state.registry.connect(label);
    let subscriber_id = subscription.id().to_string();
    tracing::info!(
        subscriber_id = %subscriber_id,
        label = subscription.label(),
        "subscriber connected"
    );

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };
                let frame = match event.to_frame() {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::error!(event_id = %event.id, error = %e, "failed to encode event");
                        continue;
                    }
                };
                if ws_sender.send(WsMessage::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = state.shutdown.cancelled() => {
                let _ = ws_sender.send(WsMessage::Close(None)).await;
                break;
            }
        }
    }

    state.registry.disconnect(&subscriber_id);
    tracing::info!(subscriber_id = %subscriber_id, "subscriber disconnected");
}
