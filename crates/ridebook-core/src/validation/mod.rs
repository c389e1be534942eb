//! Validation modules

pub mod file;

pub use file::{
    get_file_type, normalize_mime_type, validate_file, FileRule, ValidationError,
    ValidationGate, ValidationReason,
};
