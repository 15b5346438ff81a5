// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the message REST API.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Serialize;
use smsrelay_core::{ChatId, HealthStatus, Message, Page};

use crate::response::{ApiError, ApiResponse};
use crate::server::GatewayState;
use crate::validation::{ListQuery, PageQuery, SendMessageRequest, StatusUpdateRequest};

type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub service: String,
    pub version: String,
    /// "ok", "degraded" or "unavailable".
    pub status: &'static str,
    pub store: String,
    pub subscribers: usize,
    pub uptime_secs: u64,
}

/// POST {prefix}/send-message
pub async fn post_send_message(
    State(state): State<GatewayState>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<Message> {
    let Json(body) = body?;
    let input = body.validate()?;
    let message = state.lifecycle.create(input).await?;
    Ok(ApiResponse::created("Message queued for delivery", message))
}

/// POST {prefix}/send-message/status
pub async fn post_status(
    State(state): State<GatewayState>,
    body: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> ApiResult<Message> {
    let Json(body) = body?;
    let (id, status) = body.validate()?;
    let message = state.lifecycle.update_status(&id, status).await?;
    Ok(ApiResponse::ok("Message status updated", message))
}

/// GET {prefix}/messages
pub async fn get_messages(
    State(state): State<GatewayState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Page<Message>> {
    let Query(query) = query?;
    let params = query.validate()?;
    let request = state.queries.page_request(params.page, params.limit)?;
    let page = state.queries.list(&params.filter, request).await?;
    Ok(ApiResponse::ok("Messages retrieved", page))
}

/// GET {prefix}/messages/chat/{chat_id}
pub async fn get_chat_messages(
    State(state): State<GatewayState>,
    chat_id: Result<Path<String>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Page<Message>> {
    let Path(chat_id) = chat_id?;
    let Query(query) = query?;
    let (page, limit) = query.validate()?;
    let request = state.queries.page_request(page, limit)?;
    let page = state
        .queries
        .list_by_chat(&ChatId(chat_id.trim().to_string()), request)
        .await?;
    Ok(ApiResponse::ok("Chat messages retrieved", page))
}

/// GET /health
///
/// 200 while the store answers, 503 when it does not. Store failure details
/// are logged, never returned.
pub async fn get_health(State(state): State<GatewayState>) -> ApiResponse<HealthResponse> {
    let (status, store, code) = match state.store.health_check().await {
        Ok(HealthStatus::Healthy) => ("ok", "healthy", StatusCode::OK),
        Ok(HealthStatus::Degraded(reason)) => {
            tracing::warn!(%reason, "store degraded");
            ("degraded", "degraded", StatusCode::OK)
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            tracing::warn!(%reason, "store unhealthy");
            ("unavailable", "unavailable", StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(e) => {
            tracing::error!(error = %e, "store health check failed");
            ("unavailable", "unavailable", StatusCode::SERVICE_UNAVAILABLE)
        }
    };

    let body = HealthResponse {
        service: state.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status,
        store: store.to_string(),
        subscribers: state.registry.len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    };
    ApiResponse::ok("Service health", body).with_status(code)
}
