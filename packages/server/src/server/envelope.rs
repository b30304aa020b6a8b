//! Uniform response envelope: `{"resultCode": "200-1", "message": "...", "data": ...}`.
//!
//! The HTTP status is the numeric prefix of `resultCode`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::domains::chatrooms::ChatError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub result_code: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            result_code: "200-1".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for(&self.result_code)
    }
}

impl ApiResponse<()> {
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            result_code: "200-1".to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn error(result_code: &str, message: impl Into<String>) -> Self {
        Self {
            result_code: result_code.to_string(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let message = match &self {
            ChatError::Storage(e) => {
                error!(error = %e, "Chat storage failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        ApiResponse::<()>::error(self.result_code(), message).into_response()
    }
}

fn status_for(result_code: &str) -> StatusCode {
    result_code
        .split('-')
        .next()
        .and_then(|prefix| prefix.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK)
}
