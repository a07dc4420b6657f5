use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::store::GraphError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    is_operational: bool,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            is_operational: false,
        }
    }

    fn operational(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            is_operational: true,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            self.message
        } else {
            "internal server error".to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

pub fn json_error(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> AppError {
    AppError {
        status,
        code: code.into(),
        message: message.into(),
        is_operational: true,
    }
}

/// Maps the store/service error taxonomy onto the HTTP envelope.
pub fn graph_error_response(err: GraphError) -> Response {
    match err {
        GraphError::Validation(msg) => AppError::validation(msg).into_response(),
        GraphError::NotFound(msg) => AppError::not_found(msg).into_response(),
        GraphError::Timeout(ms) => json_error(
            StatusCode::GATEWAY_TIMEOUT,
            "TIMEOUT",
            format!("request timed out after {ms}ms"),
        )
        .into_response(),
        GraphError::Network(msg) => {
            tracing::warn!(error = %msg, "could not reach graph service");
            json_error(StatusCode::BAD_GATEWAY, "NETWORK_ERROR", "could not reach service")
                .into_response()
        }
        GraphError::Fetch(msg) => {
            tracing::warn!(error = %msg, "graph fetch failed");
            json_error(StatusCode::BAD_GATEWAY, "FETCH_ERROR", "could not load graph")
                .into_response()
        }
        GraphError::Consistency(msg) => {
            tracing::warn!(error = %msg, "graph consistency violation");
            AppError::internal(msg).into_response()
        }
    }
}
