//! Error types for invoiceweb-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use invoiceweb_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Upstream failure: {message}")]
    Upstream { message: String },

    #[error("Internal server error")]
    InternalError,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::NotFound { collection, id } => ApiError::NotFound {
                resource: format!("{} #{}", collection, id),
            },
            CoreError::Validation { .. } | CoreError::InvalidFormat { .. } => ApiError::BadRequest {
                message: error.to_string(),
            },
            CoreError::Unauthorized => ApiError::Unauthorized,
            CoreError::Conflict { message } => ApiError::Conflict { message },
            CoreError::LoadFailure { .. }
            | CoreError::MutationFailure { .. }
            | CoreError::Transport { .. } => ApiError::Upstream {
                message: error.to_string(),
            },
            CoreError::Cancelled { .. } | CoreError::Io { .. } => ApiError::InternalError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}
