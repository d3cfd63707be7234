//! Error types for invoiceweb-core
//!
//! Load and mutation failures are recovered locally by the list views;
//! the remaining kinds describe why a data source call failed.

use thiserror::Error;
use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Collection fetch failed
    LoadFailure,
    /// Create, update or delete failed
    MutationFailure,
    /// Record not found
    NotFound,
    /// Draft rejected
    ValidationError,
    /// Operation conflicts with related records
    Conflict,
    /// Missing or rejected credentials
    Unauthorized,
    /// Network or protocol failure
    TransportError,
    /// Payload could not be decoded
    InvalidFormat,
    /// Result arrived after the view was unmounted
    Cancelled,
    /// Fixture file missing or unreadable
    IoError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::LoadFailure => write!(f, "LOAD_FAILURE"),
            ErrorCode::MutationFailure => write!(f, "MUTATION_FAILURE"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::Conflict => write!(f, "CONFLICT"),
            ErrorCode::Unauthorized => write!(f, "UNAUTHORIZED"),
            ErrorCode::TransportError => write!(f, "TRANSPORT_ERROR"),
            ErrorCode::InvalidFormat => write!(f, "INVALID_FORMAT"),
            ErrorCode::Cancelled => write!(f, "CANCELLED"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Offending form field, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            field: None,
            suggestions: vec![],
        }
    }

    pub fn with_field(mut self, field: String) -> Self {
        self.field = Some(field);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref field) = self.field {
            write!(f, " (field: {})", field)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Debug => write!(f, "debug"),
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for invoiceweb-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Failed to load {collection}: {message}")]
    LoadFailure { collection: String, message: String },

    #[error("Failed to modify {collection}: {message}")]
    MutationFailure { collection: String, message: String },

    #[error("{collection} #{id} not found")]
    NotFound { collection: String, id: RecordId },

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("{operation} cancelled: view unmounted")]
    Cancelled { operation: String },

    #[error("IO error: {path}")]
    Io { path: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::LoadFailure { .. } => ErrorCode::LoadFailure,
            CoreError::MutationFailure { .. } => ErrorCode::MutationFailure,
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::Validation { .. } => ErrorCode::ValidationError,
            CoreError::Conflict { .. } => ErrorCode::Conflict,
            CoreError::Unauthorized => ErrorCode::Unauthorized,
            CoreError::Transport { .. } => ErrorCode::TransportError,
            CoreError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            CoreError::Cancelled { .. } => ErrorCode::Cancelled,
            CoreError::Io { .. } => ErrorCode::IoError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::LoadFailure { .. } => ErrorSeverity::Warning,
            CoreError::MutationFailure { .. } => ErrorSeverity::Warning,
            CoreError::NotFound { .. } => ErrorSeverity::Info,
            CoreError::Validation { .. } => ErrorSeverity::Info,
            CoreError::Conflict { .. } => ErrorSeverity::Info,
            CoreError::Unauthorized => ErrorSeverity::Warning,
            CoreError::Transport { .. } => ErrorSeverity::Error,
            CoreError::InvalidFormat { .. } => ErrorSeverity::Error,
            CoreError::Cancelled { .. } => ErrorSeverity::Debug,
            CoreError::Io { .. } => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::LoadFailure { .. } => {
                details = details.with_suggestion(
                    "Use the reload action to fetch the collection again.".to_string()
                );
            }
            CoreError::Validation { field, .. } => {
                details = details.with_field(field.clone());
            }
            CoreError::Unauthorized => {
                details = details.with_suggestion("Log in again.".to_string());
            }
            CoreError::InvalidFormat { .. } => {
                details = details.with_suggestion(
                    "Check that the API version matches this client.".to_string()
                );
            }
            CoreError::Io { path } => {
                details = details.with_suggestion(format!(
                    "Ensure the file '{}' exists and is readable.", path
                ));
            }
            _ => {}
        }

        details
    }

    /// Whether the failure should be reported to the user
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, CoreError::Cancelled { .. })
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Collection the operation targets
    pub collection: Option<String>,
    /// Record the operation targets
    pub record_id: Option<RecordId>,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            collection: None,
            record_id: None,
        }
    }

    pub fn with_collection(mut self, collection: &str) -> Self {
        self.collection = Some(collection.to_string());
        self
    }

    pub fn with_record(mut self, id: RecordId) -> Self {
        self.record_id = Some(id);
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Debug, Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let collection = context.collection.as_deref().unwrap_or("-");
        match error.severity() {
            ErrorSeverity::Debug => log::debug!(
                target: "invoiceweb::error",
                "{} - Operation: {} - Collection: {} - Record: {:?}",
                error, context.operation, collection, context.record_id
            ),
            ErrorSeverity::Info => log::info!(
                target: "invoiceweb::error",
                "{} - Operation: {} - Collection: {} - Record: {:?}",
                error, context.operation, collection, context.record_id
            ),
            ErrorSeverity::Warning => log::warn!(
                target: "invoiceweb::error",
                "{} - Operation: {} - Collection: {} - Record: {:?}",
                error.to_details(), context.operation, collection, context.record_id
            ),
            ErrorSeverity::Error => log::error!(
                target: "invoiceweb::error",
                "{} - Operation: {} - Collection: {} - Record: {:?}",
                error.to_details(), context.operation, collection, context.record_id
            ),
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::LoadFailure.to_string(), "LOAD_FAILURE");
        assert_eq!(ErrorCode::MutationFailure.to_string(), "MUTATION_FAILURE");
        assert_eq!(ErrorCode::InvalidFormat.to_string(), "INVALID_FORMAT");
    }

    #[test]
    fn test_core_error_code_and_severity() {
        let error = CoreError::LoadFailure {
            collection: "invoices".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(error.code(), ErrorCode::LoadFailure);
        assert_eq!(error.severity(), ErrorSeverity::Warning);

        let error = CoreError::Cancelled { operation: "load".to_string() };
        assert_eq!(error.severity(), ErrorSeverity::Debug);
        assert!(!error.is_user_visible());
    }

    #[test]
    fn test_validation_details_carry_field() {
        let error = CoreError::Validation {
            field: "amount".to_string(),
            message: "must be greater than 0".to_string(),
        };
        let details = error.to_details();
        assert_eq!(details.code, ErrorCode::ValidationError);
        assert_eq!(details.field.as_deref(), Some("amount"));
        assert!(details.message.contains("amount"));
    }

    #[test]
    fn test_load_failure_suggests_reload() {
        let error = CoreError::LoadFailure {
            collection: "customers".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(!error.to_details().suggestions.is_empty());
        assert!(error.to_string().contains("customers"));
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("remove")
            .with_collection("invoices")
            .with_record(7);
        assert_eq!(context.operation, "remove");
        assert_eq!(context.collection.as_deref(), Some("invoices"));
        assert_eq!(context.record_id, Some(7));
    }
}
