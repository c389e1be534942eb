//! File acceptability checks
//!
//! Pure, synchronous checks run before any network call: byte size against the
//! document category's limit and MIME type against its allow-list.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::config::ClientConfig;
use crate::constants::MIB;
use crate::models::{DocumentFile, FileType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    TooLarge { size: u64, limit: u64 },
    UnsupportedType { content_type: String },
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", describe(.file_type, .reason))]
pub struct ValidationError {
    pub file_type: FileType,
    pub reason: ValidationReason,
}

fn describe(file_type: &FileType, reason: &ValidationReason) -> String {
    let label = file_type.label();
    match reason {
        ValidationReason::TooLarge { size, limit } => format!(
            "{} is too large: {} exceeds the {} limit",
            label,
            format_size(*size),
            format_size(*limit)
        ),
        ValidationReason::UnsupportedType { content_type } => format!(
            "{} type '{}' is not supported. Allowed types: {}",
            label,
            content_type,
            file_type.allowed_content_types().join(", ")
        ),
        ValidationReason::Empty => format!("{} is empty", label),
    }
}

fn format_size(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / MIB as f64)
}

/// Size limit and MIME allow-list for one document category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRule {
    pub max_size_bytes: u64,
    pub allowed_content_types: &'static [&'static str],
}

impl Display for FileRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "max {}, types {}",
            format_size(self.max_size_bytes),
            self.allowed_content_types.join(", ")
        )
    }
}

/// Per-category rule set. Limits can be overridden from configuration; the
/// allow-lists are fixed per category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationGate {
    rules: BTreeMap<FileType, FileRule>,
}

impl Default for ValidationGate {
    fn default() -> Self {
        let rules = FileType::ALL
            .into_iter()
            .map(|file_type| {
                (
                    file_type,
                    FileRule {
                        max_size_bytes: file_type.default_max_size_bytes(),
                        allowed_content_types: file_type.allowed_content_types(),
                    },
                )
            })
            .collect();
        Self { rules }
    }
}

impl ValidationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        FileType::ALL
            .into_iter()
            .fold(Self::default(), |gate, file_type| {
                gate.with_max_size(file_type, config.max_size_bytes(file_type))
            })
    }

    pub fn with_max_size(mut self, file_type: FileType, max_size_bytes: u64) -> Self {
        if let Some(rule) = self.rules.get_mut(&file_type) {
            rule.max_size_bytes = max_size_bytes;
        }
        self
    }

    pub fn rule(&self, file_type: FileType) -> FileRule {
        self.rules.get(&file_type).cloned().unwrap_or(FileRule {
            max_size_bytes: file_type.default_max_size_bytes(),
            allowed_content_types: file_type.allowed_content_types(),
        })
    }

    /// Check a file against the category's size limit and MIME allow-list.
    pub fn validate_file(&self, file: &DocumentFile, file_type: FileType) -> Result<(), ValidationError> {
        let rule = self.rule(file_type);
        let size = file.size();

        if size == 0 {
            return Err(ValidationError {
                file_type,
                reason: ValidationReason::Empty,
            });
        }

        if size > rule.max_size_bytes {
            return Err(ValidationError {
                file_type,
                reason: ValidationReason::TooLarge {
                    size,
                    limit: rule.max_size_bytes,
                },
            });
        }

        let normalized = normalize_mime_type(&file.content_type).to_lowercase();
        if !rule
            .allowed_content_types
            .iter()
            .any(|allowed| normalized == *allowed)
        {
            return Err(ValidationError {
                file_type,
                reason: ValidationReason::UnsupportedType {
                    content_type: file.content_type.clone(),
                },
            });
        }

        Ok(())
    }
}

/// Validate against the default rule set.
pub fn validate_file(file: &DocumentFile, file_type: FileType) -> Result<(), ValidationError> {
    ValidationGate::default().validate_file(file, file_type)
}

/// Map a form field identifier to its document category.
///
/// # Panics
///
/// Panics on an unknown identifier. Field identifiers are fixed by the form
/// definitions, so an unknown one is a programming error; use
/// [`FileType::from_field_id`] for untrusted input.
pub fn get_file_type(field_id: &str) -> FileType {
    match FileType::from_field_id(field_id) {
        Some(file_type) => file_type,
        None => panic!("unknown document field identifier: {}", field_id),
    }
}

/// Normalize MIME type by stripping parameters (e.g. "application/pdf; charset=binary" -> "application/pdf").
pub fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}
