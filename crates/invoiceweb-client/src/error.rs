//! Error types for invoiceweb-client

use invoiceweb_core::CoreError;
use thiserror::Error;

/// REST client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Unsupported scheme in '{url}': only http:// is available")]
    UnsupportedScheme { url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Failed to build request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("{method} {url} returned {status}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status of a rejected request
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type with ClientError
pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for CoreError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Status { status: 401 | 403, .. } => CoreError::Unauthorized,
            ClientError::Status { status: 400 | 422, ref body, .. } => {
                match crate::hydra::first_violation(body) {
                    Some((field, message)) => CoreError::Validation { field, message },
                    None => CoreError::Transport { message: error.to_string() },
                }
            }
            ClientError::Json(e) => CoreError::InvalidFormat { message: e.to_string() },
            other => CoreError::Transport { message: other.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, body: &str) -> ClientError {
        ClientError::Status {
            method: "POST".to_string(),
            url: "http://localhost/api/invoices".to_string(),
            status: code,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_auth_statuses_map_to_unauthorized() {
        assert_eq!(CoreError::from(status(401, "")), CoreError::Unauthorized);
        assert_eq!(CoreError::from(status(403, "")), CoreError::Unauthorized);
    }

    #[test]
    fn test_violation_maps_to_validation() {
        let body = r#"{"violations":[{"propertyPath":"amount","message":"Le montant est obligatoire"}]}"#;
        match CoreError::from(status(400, body)) {
            CoreError::Validation { field, message } => {
                assert_eq!(field, "amount");
                assert_eq!(message, "Le montant est obligatoire");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_server_error_is_transport() {
        let error = CoreError::from(status(500, "oops"));
        assert!(matches!(error, CoreError::Transport { .. }));
        assert!(error.to_string().contains("500"));
    }
}
