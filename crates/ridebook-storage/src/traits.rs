//! Direct upload abstraction
//!
//! This module defines the trait every object-store writer implements.

use async_trait::async_trait;
use ridebook_core::error_message::ExtractedError;
use ridebook_core::models::{DocumentFile, UploadTicket};
use ridebook_core::{AppError, ErrorKind};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Transient transport failure; a fresh attempt may succeed
    #[error("Network error: {0}")]
    Network(String),

    /// The ticket's `expires_at` passed before the write completed
    #[error("Upload ticket expired: {0}")]
    ExpiredTicket(String),

    /// The ticket was already consumed by an earlier successful write
    #[error("Upload ticket already used: {0}")]
    TicketAlreadyUsed(String),

    /// Opaque rejection by the store
    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<ExtractedError> for StorageError {
    fn from(extracted: ExtractedError) -> Self {
        match extracted.kind {
            ErrorKind::ExpiredTicket => StorageError::ExpiredTicket(extracted.message),
            ErrorKind::Network => StorageError::Network(extracted.message),
            _ => StorageError::Rejected(extracted.message),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Network(message) => AppError::Network(message),
            // A consumed ticket is as inert as an expired one: restart at ticket issuance.
            StorageError::ExpiredTicket(message) | StorageError::TicketAlreadyUsed(message) => {
                AppError::ExpiredTicket(message)
            }
            StorageError::Rejected(message) => AppError::Storage(message),
            StorageError::ConfigError(message) => AppError::Config(message),
        }
    }
}

/// Writer for step two of the upload protocol.
///
/// Implementations write the file using only what the ticket carries. They never
/// retry and never check expiry locally; the store decides.
#[async_trait]
pub trait DirectUploader: Send + Sync {
    /// Write `file` under the ticket's storage key. Returns the storage key on success.
    async fn upload(&self, ticket: &UploadTicket, file: &DocumentFile) -> StorageResult<String>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
