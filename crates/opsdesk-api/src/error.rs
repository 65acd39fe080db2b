//! Error types for opsdesk-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use opsdesk_core::{CoreError, ErrorCode, ErrorDetails};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// A core failure, rendered with its details
    #[error("{0}")]
    Core(#[from] CoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Core(err) => match err {
                CoreError::Validation { .. } | CoreError::InvalidRange { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CoreError::UnknownList { .. } => StatusCode::NOT_FOUND,
                CoreError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
                CoreError::Unauthorized => StatusCode::UNAUTHORIZED,
                CoreError::Transport { .. }
                | CoreError::Status { .. }
                | CoreError::Rejected { .. }
                | CoreError::Decode { .. } => StatusCode::BAD_GATEWAY,
                CoreError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn to_details(&self) -> ErrorDetails {
        match self {
            ApiError::BadRequest { .. } => {
                ErrorDetails::new(ErrorCode::ValidationError, self.to_string())
            }
            ApiError::Core(err) => err.to_details(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!(target: "opsdesk::error", "{}", self);
        }
        let body = serde_json::json!({
            "success": false,
            "error": self.to_details(),
        });
        (status, Json(body)).into_response()
    }
}
