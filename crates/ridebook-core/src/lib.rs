//! Ridebook Core Library
//!
//! Domain models, error types, configuration and file validation shared by the
//! driver-management crates (api client, storage uploader, workflow services, CLI).

pub mod config;
pub mod constants;
pub mod error;
pub mod error_message;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{Auth, ClientConfig};
pub use error::{AppError, ErrorKind, ErrorMetadata, LogLevel};
pub use error_message::{extract_error_message, ErrorSource, ExtractedError, FieldError};
pub use validation::{get_file_type, validate_file, ValidationGate};
