//! Error types for opsdesk-core
//!
//! Every failure a list view can observe is expressed as a [`CoreError`].
//! Views never propagate these upward; they store the [`ErrorDetails`]
//! form on their snapshot so the presentation layer can render it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Filter or action input failed validation
    ValidationError,
    /// A min/max pair is inverted
    InvalidRange,
    /// Network failure or timeout
    TransportError,
    /// Non-2xx response from the remote API
    UpstreamStatus,
    /// Remote API answered `success: false`
    Rejected,
    /// Response body could not be decoded
    DecodeError,
    /// Realtime hub is not connected
    NotConnected,
    /// Event publisher presented a wrong or missing token
    Unauthorized,
    /// Unknown list name
    UnknownList,
    /// Internal error
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::InvalidRange => write!(f, "INVALID_RANGE"),
            ErrorCode::TransportError => write!(f, "TRANSPORT_ERROR"),
            ErrorCode::UpstreamStatus => write!(f, "UPSTREAM_STATUS"),
            ErrorCode::Rejected => write!(f, "REJECTED"),
            ErrorCode::DecodeError => write!(f, "DECODE_ERROR"),
            ErrorCode::NotConnected => write!(f, "NOT_CONNECTED"),
            ErrorCode::Unauthorized => write!(f, "UNAUTHORIZED"),
            ErrorCode::UnknownList => write!(f, "UNKNOWN_LIST"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Detailed error information for snapshots and API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Filter key the error belongs to, for inline rendering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Whether a manual retry is worth offering
    pub retryable: bool,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            field: None,
            details: None,
            suggestions: vec![],
            retryable: false,
        }
    }

    pub fn with_field(mut self, field: String) -> Self {
        self.field = Some(field);
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
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
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for opsdesk-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{min_field} ({min}) must not be greater than {max_field} ({max})")]
    InvalidRange {
        min_field: String,
        max_field: String,
        min: String,
        max: String,
    },

    #[error("Request failed: {message}")]
    Transport { message: String },

    #[error("Remote API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Remote API rejected the request: {message}")]
    Rejected { message: String },

    #[error("Could not decode response: {message}")]
    Decode { message: String },

    #[error("Realtime channel is not connected")]
    NotConnected,

    #[error("Realtime token does not match")]
    Unauthorized,

    #[error("Unknown list: {name}")]
    UnknownList { name: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// Shorthand for a field validation failure
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Validation { .. } => ErrorCode::ValidationError,
            CoreError::InvalidRange { .. } => ErrorCode::InvalidRange,
            CoreError::Transport { .. } => ErrorCode::TransportError,
            CoreError::Status { .. } => ErrorCode::UpstreamStatus,
            CoreError::Rejected { .. } => ErrorCode::Rejected,
            CoreError::Decode { .. } => ErrorCode::DecodeError,
            CoreError::NotConnected => ErrorCode::NotConnected,
            CoreError::Unauthorized => ErrorCode::Unauthorized,
            CoreError::UnknownList { .. } => ErrorCode::UnknownList,
            CoreError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Validation { .. } => ErrorSeverity::Info,
            CoreError::InvalidRange { .. } => ErrorSeverity::Info,
            CoreError::Transport { .. } => ErrorSeverity::Error,
            CoreError::Status { status, .. } if *status >= 500 => ErrorSeverity::Error,
            CoreError::Status { .. } => ErrorSeverity::Warning,
            CoreError::Rejected { .. } => ErrorSeverity::Warning,
            CoreError::Decode { .. } => ErrorSeverity::Error,
            CoreError::NotConnected => ErrorSeverity::Warning,
            CoreError::Unauthorized => ErrorSeverity::Warning,
            CoreError::UnknownList { .. } => ErrorSeverity::Info,
            CoreError::Internal { .. } => ErrorSeverity::Critical,
        }
    }

    /// Validation problems are fixed by the operator, not by retrying
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::Validation { .. } | CoreError::InvalidRange { .. }
        )
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::Validation { field, .. } => {
                details = details.with_field(field.clone());
            }
            CoreError::InvalidRange {
                min_field, max_field, ..
            } => {
                details = details
                    .with_field(min_field.clone())
                    .with_detail(serde_json::json!({ "min": min_field, "max": max_field }))
                    .with_suggestion(format!(
                        "Swap the values or lower {} below {}.",
                        min_field, max_field
                    ));
            }
            CoreError::Transport { .. } => {
                details = details
                    .retryable()
                    .with_suggestion("Check that the remote API is reachable.".to_string());
            }
            CoreError::Status { status, .. } => {
                details = details.with_detail(serde_json::json!({ "status": status }));
                if *status == 401 || *status == 403 {
                    details = details.with_suggestion(
                        "Check remote.token in the configuration.".to_string(),
                    );
                } else {
                    details = details.retryable();
                }
            }
            CoreError::Decode { .. } => {
                details = details.retryable().with_suggestion(
                    "The remote API may have changed its response shape.".to_string(),
                );
            }
            CoreError::UnknownList { .. } => {
                details = details.with_suggestion(
                    "Known lists are members, products and withdrawals.".to_string(),
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// List the error happened in
    pub list: Option<String>,
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: &str) -> Self {
        Self {
            list: None,
            operation: operation.to_string(),
            data: serde_json::json!({}),
        }
    }

    pub fn with_list(mut self, list: &str) -> Self {
        self.list = Some(list.to_string());
        self
    }

    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Debug, Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let list = context.list.as_deref().unwrap_or("-");
        match error.severity() {
            ErrorSeverity::Info => log::info!(
                target: "opsdesk::error",
                "[{}] {} - list: {} - operation: {}",
                error.code(), error, list, context.operation
            ),
            ErrorSeverity::Warning => log::warn!(
                target: "opsdesk::error",
                "[{}] {} - list: {} - operation: {}",
                error.code(), error, list, context.operation
            ),
            ErrorSeverity::Error | ErrorSeverity::Critical => log::error!(
                target: "opsdesk::error",
                "[{}] {} - list: {} - operation: {} - data: {}",
                error.code(), error, list, context.operation, context.data
            ),
        }
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "opsdesk::error",
            "{} - list: {} - operation: {}",
            message,
            context.list.as_deref().unwrap_or("-"),
            context.operation
        );
    }
}

// ==================== Tests ====================
