// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `smsrelay serve` command implementation.
//!
//! Opens the SQLite store, wires the lifecycle, query engine and subscriber
//! registry into the gateway, and serves until SIGINT/SIGTERM.

use std::sync::Arc;

use smsrelay_bus::SubscriberRegistry;
use smsrelay_config::SmsRelayConfig;
use smsrelay_config::model::GatewayConfig;
use smsrelay_core::{MessageStore, SmsRelayError};
use smsrelay_gateway::{GatewayServer, GatewayState, ServerConfig};
use smsrelay_storage::SqliteMessageStore;
use tracing::{error, info};

use crate::shutdown;

/// Runs the service until a shutdown signal arrives.
pub async fn run_serve(config: SmsRelayConfig) -> Result<(), SmsRelayError> {
    init_tracing(&config.service.log_level);
    info!(
        service = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        "starting smsrelay"
    );

    let store = Arc::new(SqliteMessageStore::new(config.storage.clone()));
    store
        .initialize()
        .await
        .inspect_err(|e| error!(error = %e, "failed to open message store"))?;
    info!(path = %config.storage.database_path, "message store ready");

    let registry = Arc::new(SubscriberRegistry::new(config.gateway.subscriber_buffer));
    let cancel = shutdown::install_signal_handler();
    let state = GatewayState::new(
        store.clone(),
        registry,
        config.query.default_limit,
        config.service.name.clone(),
        cancel.clone(),
    );

    let gateway = GatewayServer::new(server_config(&config.gateway), state);
    let addr = gateway.start().await?;
    info!(%addr, prefix = %config.gateway.api_prefix, "smsrelay ready");

    // Returns once the token is cancelled and in-flight requests finish,
    // or early if the server fails.
    let served = gateway.wait().await;
    cancel.cancel();

    if let Err(e) = store.close().await {
        error!(error = %e, "failed to close message store");
    }
    info!("smsrelay stopped");
    served
}

fn server_config(gateway: &GatewayConfig) -> ServerConfig {
    ServerConfig {
        host: gateway.host.clone(),
        port: gateway.port,
        api_prefix: gateway.api_prefix.clone(),
        permissive_cors: gateway.permissive_cors,
    }
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("smsrelay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
