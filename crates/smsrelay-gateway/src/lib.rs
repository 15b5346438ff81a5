// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for smsrelay.
//!
//! Exposes message creation, status updates and listings as a JSON REST API
//! under a configurable prefix, plus a `/ws` endpoint where subscribers
//! receive lifecycle events as they happen. The server runs as a background
//! task and stops when the shared cancellation token fires.

pub mod handlers;
pub mod response;
pub mod server;
pub mod validation;
pub mod ws;

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::Router;
use smsrelay_core::{AdapterType, HealthStatus, PluginAdapter, SmsRelayError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub use response::{ApiError, ApiResponse};
pub use server::{GatewayState, ServerConfig, build_router};

/// The gateway server and its background task.
pub struct GatewayServer {
    config: ServerConfig,
    state: GatewayState,
    handle: Mutex<Option<JoinHandle<Result<(), SmsRelayError>>>>,
}

impl GatewayServer {
    pub fn new(config: ServerConfig, state: GatewayState) -> Self {
        Self {
            config,
            state,
            handle: Mutex::new(None),
        }
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    /// The router this server serves, for in-process testing.
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Bind and start serving in the background. Returns the bound address.
    pub async fn start(&self) -> Result<SocketAddr, SmsRelayError> {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return Err(SmsRelayError::Gateway {
                message: "gateway already started".to_string(),
                source: None,
            });
        }

        let listener = server::bind(&self.config).await?;
        let addr = server::local_addr(&listener)?;
        let router = self.router();
        let shutdown = self.state.shutdown.clone();

        *handle = Some(tokio::spawn(async move {
            server::serve(listener, router, shutdown)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "gateway server error"))
        }));
        Ok(addr)
    }

    /// Wait for the background task to finish. Returns immediately if the
    /// server was never started.
    pub async fn wait(&self) -> Result<(), SmsRelayError> {
        let handle = self.handle.lock().await.take();
        match handle {
            Some(h) => h
                .await
                .map_err(|e| SmsRelayError::Internal(format!("gateway task failed: {e}")))?,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PluginAdapter for GatewayServer {
    fn name(&self) -> &str {
        "gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, SmsRelayError> {
        let handle = self.handle.lock().await;
        Ok(match handle.as_ref() {
            Some(h) if !h.is_finished() => HealthStatus::Healthy,
            Some(_) => HealthStatus::Unhealthy("server stopped".to_string()),
            None => HealthStatus::Unhealthy("server not started".to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), SmsRelayError> {
        self.state.shutdown.cancel();
        self.wait().await
    }
}
