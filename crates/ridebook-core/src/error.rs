//! Error types module
//!
//! Every failure in the driver pipeline is an `AppError`. Backend and storage
//! responses are turned into `AppError` through `error_message::extract_error_message`,
//! so callers only ever match on the coarse `ErrorKind`.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error_message::{ExtractedError, FieldError};
use crate::validation::ValidationError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors like validation failures
    Debug,
    /// Recoverable issues like rate limits or expired tickets
    Warn,
    /// Unexpected failures
    Error,
}

/// Coarse error category used for recovery decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Network,
    Auth,
    Conflict,
    NotFound,
    RateLimit,
    ExpiredTicket,
    Storage,
    Busy,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Network => "network",
            ErrorKind::Auth => "auth",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ExpiredTicket => "expired_ticket",
            ErrorKind::Storage => "storage",
            ErrorKind::Busy => "busy",
            ErrorKind::Internal => "internal",
        }
    }

    /// Generic user-facing text used when a response carried nothing readable.
    pub fn generic_message(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Some fields are invalid",
            ErrorKind::Network => "Network error, please check your connection and retry",
            ErrorKind::Auth => "Your session is not authorized for this action",
            ErrorKind::Conflict => "A driver with these details already exists",
            ErrorKind::NotFound => "The driver no longer exists",
            ErrorKind::RateLimit => "Too many requests, please wait a moment",
            ErrorKind::ExpiredTicket => "The upload link expired",
            ErrorKind::Storage => "The file could not be stored",
            ErrorKind::Busy => "A submission is already in progress",
            ErrorKind::Internal => "Something went wrong",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Metadata for error presentation - describes how an error should be surfaced
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "CONFLICT")
    fn error_code(&self) -> &'static str;

    /// Whether a fresh user-initiated attempt can succeed without changing input
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-presentable message
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid file: {0}")]
    InvalidFile(#[from] ValidationError),

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Auth(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Upload ticket expired: {0}")]
    ExpiredTicket(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        let message = fields
            .iter()
            .map(|f| f.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        AppError::Validation { message, fields }
    }
}

impl From<ExtractedError> for AppError {
    fn from(extracted: ExtractedError) -> Self {
        let ExtractedError {
            kind,
            message,
            fields,
        } = extracted;
        match kind {
            ErrorKind::Validation => AppError::Validation { message, fields },
            ErrorKind::Network => AppError::Network(message),
            ErrorKind::Auth => AppError::Auth(message),
            ErrorKind::Conflict => AppError::Conflict(message),
            ErrorKind::NotFound => AppError::NotFound(message),
            ErrorKind::RateLimit => AppError::RateLimited(message),
            ErrorKind::ExpiredTicket => AppError::ExpiredTicket(message),
            ErrorKind::Storage => AppError::Storage(message),
            ErrorKind::Busy => AppError::Busy(message),
            ErrorKind::Internal => AppError::Internal(message),
        }
    }
}

/// Static metadata for each kind: (error_code, recoverable, suggested_action, log_level).
fn kind_static_metadata(kind: ErrorKind) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match kind {
        ErrorKind::Validation => (
            "VALIDATION_ERROR",
            false,
            Some("Correct the highlighted fields and submit again"),
            LogLevel::Debug,
        ),
        ErrorKind::Network => (
            "NETWORK_ERROR",
            true,
            Some("Check your connection and retry"),
            LogLevel::Warn,
        ),
        ErrorKind::Auth => (
            "AUTH_ERROR",
            false,
            Some("Sign in again"),
            LogLevel::Warn,
        ),
        ErrorKind::Conflict => (
            "CONFLICT",
            false,
            Some("Use a different license number or edit the existing driver"),
            LogLevel::Debug,
        ),
        ErrorKind::NotFound => (
            "NOT_FOUND",
            false,
            Some("The list was refreshed; pick the driver again"),
            LogLevel::Debug,
        ),
        ErrorKind::RateLimit => (
            "RATE_LIMITED",
            true,
            Some("Wait a moment and retry"),
            LogLevel::Warn,
        ),
        ErrorKind::ExpiredTicket => (
            "UPLOAD_TICKET_EXPIRED",
            true,
            Some("Retry the upload to request a new upload link"),
            LogLevel::Warn,
        ),
        ErrorKind::Storage => (
            "STORAGE_ERROR",
            true,
            Some("Retry the upload"),
            LogLevel::Error,
        ),
        ErrorKind::Busy => (
            "BUSY",
            true,
            Some("Wait for the pending submission to finish"),
            LogLevel::Debug,
        ),
        ErrorKind::Internal => (
            "INTERNAL_ERROR",
            false,
            Some("Contact support if this error persists"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidFile(_) | AppError::Validation { .. } => ErrorKind::Validation,
            AppError::Network(_) => ErrorKind::Network,
            AppError::Auth(_) => ErrorKind::Auth,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::RateLimited(_) => ErrorKind::RateLimit,
            AppError::ExpiredTicket(_) => ErrorKind::ExpiredTicket,
            AppError::Storage(_) => ErrorKind::Storage,
            AppError::Busy(_) => ErrorKind::Busy,
            AppError::Config(_) | AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Field-level errors, when the failure carried any.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            AppError::Validation { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        kind_static_metadata(self.kind()).0
    }

    fn is_recoverable(&self) -> bool {
        kind_static_metadata(self.kind()).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        kind_static_metadata(self.kind()).2
    }

    fn log_level(&self) -> LogLevel {
        kind_static_metadata(self.kind()).3
    }

    fn client_message(&self) -> String {
        let message = match self {
            AppError::InvalidFile(err) => err.to_string(),
            AppError::Validation { message, .. }
            | AppError::Network(message)
            | AppError::Auth(message)
            | AppError::Conflict(message)
            | AppError::NotFound(message)
            | AppError::RateLimited(message)
            | AppError::ExpiredTicket(message)
            | AppError::Storage(message)
            | AppError::Busy(message) => message.clone(),
            AppError::Config(_) | AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                String::new()
            }
        };

        if message.trim().is_empty() {
            self.kind().generic_message().to_string()
        } else {
            message
        }
    }
}
