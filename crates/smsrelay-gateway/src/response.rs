// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Uniform JSON envelope for every REST response.
//!
//! ```json
//! {"error": false, "status": 201, "message": "…", "response": {"data": {…}}}
//! {"error": true, "status": 400, "message": "…", "response": {"data": [{"field": "phone", "message": "…"}]}}
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use smsrelay_core::SmsRelayError;

/// Wire shape shared by success and error responses.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub error: bool,
    pub status: u16,
    pub message: String,
    pub response: Option<ResponseData<T>>,
}

#[derive(Debug, Serialize)]
pub struct ResponseData<T> {
    pub data: T,
}

/// A successful response carrying `data`.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: &'static str,
    data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: &'static str, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message,
            data,
        }
    }

    pub fn created(message: &'static str, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message,
            data,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            error: false,
            status: self.status.as_u16(),
            message: self.message.to_string(),
            response: Some(ResponseData { data: self.data }),
        };
        (self.status, Json(body)).into_response()
    }
}

/// A failed request. Wraps the domain error and picks the HTTP status.
#[derive(Debug)]
pub struct ApiError(pub SmsRelayError);

impl From<SmsRelayError> for ApiError {
    fn from(err: SmsRelayError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(SmsRelayError::invalid("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(SmsRelayError::invalid("query", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(SmsRelayError::invalid("path", rejection.body_text()))
    }
}

fn envelope_error<T: Serialize>(status: StatusCode, message: String, data: Option<T>) -> Response {
    let body = Envelope {
        error: true,
        status: status.as_u16(),
        message,
        response: data.map(|data| ResponseData { data }),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            SmsRelayError::Validation { fields } => envelope_error(
                StatusCode::BAD_REQUEST,
                "validation failed".to_string(),
                Some(fields),
            ),
            err @ SmsRelayError::NotFound { .. } => {
                envelope_error::<()>(StatusCode::NOT_FOUND, err.to_string(), None)
            }
            err @ SmsRelayError::Storage { .. } => {
                tracing::error!(error = %err, "request failed: storage unavailable");
                envelope_error::<()>(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage unavailable".to_string(),
                    None,
                )
            }
            err => {
                tracing::error!(error = %err, "request failed");
                envelope_error::<()>(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                    None,
                )
            }
        }
    }
}
