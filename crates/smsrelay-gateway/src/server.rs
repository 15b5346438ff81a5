// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    routing::{get, post},
};
use smsrelay_bus::{NotificationBroadcaster, SubscriberRegistry};
use smsrelay_core::{MessageStore, SmsRelayError};
use smsrelay_lifecycle::{MessageLifecycle, QueryEngine};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub lifecycle: MessageLifecycle,
    pub queries: QueryEngine,
    /// Probed by `/health`.
    pub store: Arc<dyn MessageStore>,
    /// WebSocket connections register here.
    pub registry: Arc<SubscriberRegistry>,
    pub service_name: String,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Cancelled on shutdown; open sockets close when it fires.
    pub shutdown: CancellationToken,
}

impl GatewayState {
    /// Wire the lifecycle and query engine around one store and registry.
    pub fn new(
        store: Arc<dyn MessageStore>,
        registry: Arc<SubscriberRegistry>,
        default_limit: u32,
        service_name: impl Into<String>,
        shutdown: CancellationToken,
    ) -> Self {
        let broadcaster = NotificationBroadcaster::new(Arc::clone(&registry));
        Self {
            lifecycle: MessageLifecycle::new(Arc::clone(&store), broadcaster),
            queries: QueryEngine::new(Arc::clone(&store), default_limit),
            store,
            registry,
            service_name: service_name.into(),
            start_time: Instant::now(),
            shutdown,
        }
    }
}

/// Gateway server configuration (mirrors `GatewayConfig` from smsrelay-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Mount point of the REST API, e.g. `/v1/sms`.
    pub api_prefix: String,
    pub permissive_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3515,
            api_prefix: "/v1/sms".to_string(),
            permissive_cors: true,
        }
    }
}

/// Build the full router:
/// - POST {prefix}/send-message
/// - POST {prefix}/send-message/status
/// - GET {prefix}/messages
/// - GET {prefix}/messages/chat/{chat_id}
/// - GET /health
/// - GET /ws
pub fn build_router(state: GatewayState, config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        .route("/send-message", post(handlers::post_send_message))
        .route("/send-message/status", post(handlers::post_status))
        .route("/messages", get(handlers::get_messages))
        .route("/messages/chat/{chat_id}", get(handlers::get_chat_messages));

    let prefix = config.api_prefix.trim_end_matches('/');
    let router = if prefix.is_empty() {
        Router::new().merge(api_routes)
    } else {
        Router::new().nest(prefix, api_routes)
    };

    let router = router
        .route("/health", get(handlers::get_health))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.permissive_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Bind the listening socket. Port 0 picks a free port.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, SmsRelayError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|e| SmsRelayError::Gateway {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Serve `router` on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), SmsRelayError> {
    let addr = local_addr(&listener)?;
    tracing::info!(%addr, "gateway listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| SmsRelayError::Gateway {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(%addr, "gateway stopped");
    Ok(())
}

pub(crate) fn local_addr(listener: &TcpListener) -> Result<SocketAddr, SmsRelayError> {
    listener.local_addr().map_err(|e| SmsRelayError::Gateway {
        message: format!("listener has no local address: {e}"),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3515);
        assert_eq!(config.api_prefix, "/v1/sms");
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn bind_reports_gateway_error_for_bad_host() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let err = bind(&config).await.unwrap_err();
        assert!(matches!(err, SmsRelayError::Gateway { .. }));
    }

    #[tokio::test]
    async fn bind_port_zero_picks_a_port() {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        let listener = bind(&config).await.unwrap();
        assert_ne!(local_addr(&listener).unwrap().port(), 0);
    }
}
