//! Error-message extraction
//!
//! Backend and object-store failures come in many shapes (JSON envelopes,
//! field-error lists, S3 XML documents, bare text, empty bodies). This module
//! turns any of them into a user-presentable message plus a coarse
//! [`ErrorKind`]. Extraction never fails; unknown shapes degrade to the
//! kind's generic message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::MAX_ERROR_MESSAGE_LENGTH;
use crate::error::ErrorKind;

/// Which collaborator produced the response. Status codes mean different
/// things for the application backend and the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    Backend,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedError {
    pub kind: ErrorKind,
    pub message: String,
    pub fields: Vec<FieldError>,
}

impl ExtractedError {
    /// Request never produced a response (connect failure, timeout, reset).
    pub fn transport() -> Self {
        Self {
            kind: ErrorKind::Network,
            message: ErrorKind::Network.generic_message().to_string(),
            fields: Vec::new(),
        }
    }
}

/// Parsed pieces of an error body before classification.
#[derive(Debug, Default)]
struct BodyDetails {
    code: Option<String>,
    message: Option<String>,
    fields: Vec<FieldError>,
}

/// Extract a presentable error from a failed response.
///
/// `status` is `None` when no HTTP response was received.
pub fn extract_error_message(source: ErrorSource, status: Option<u16>, body: &str) -> ExtractedError {
    let Some(status) = status else {
        return ExtractedError::transport();
    };

    let details = parse_body(body);
    let kind = classify(source, status, &details);

    let message = match (&details.message, details.fields.is_empty()) {
        (Some(message), _) => message.clone(),
        (None, false) => details
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.field, f.message))
            .collect::<Vec<_>>()
            .join("; "),
        (None, true) => kind.generic_message().to_string(),
    };

    ExtractedError {
        kind,
        message,
        fields: details.fields,
    }
}

fn classify(source: ErrorSource, status: u16, details: &BodyDetails) -> ErrorKind {
    match source {
        ErrorSource::Backend => match status {
            400 | 422 => ErrorKind::Validation,
            401 | 403 => ErrorKind::Auth,
            404 | 410 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimit,
            500..=599 => ErrorKind::Network,
            _ => ErrorKind::Internal,
        },
        ErrorSource::Storage => {
            if (status == 400 || status == 403) && mentions_expired_ticket(details) {
                ErrorKind::ExpiredTicket
            } else if status == 408 || (500..=599).contains(&status) {
                ErrorKind::Network
            } else {
                ErrorKind::Storage
            }
        }
    }
}

fn mentions_expired_ticket(details: &BodyDetails) -> bool {
    let code = details.code.as_deref().unwrap_or_default().to_lowercase();
    let message = details.message.as_deref().unwrap_or_default().to_lowercase();
    code.contains("expired")
        || message.contains("expired")
        || message.contains("already used")
        || message.contains("already been used")
}

fn parse_body(body: &str) -> BodyDetails {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return BodyDetails::default();
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return parse_json(&value);
    }

    if trimmed.starts_with('<') {
        return parse_xml(trimmed);
    }

    BodyDetails {
        message: Some(truncate(trimmed)),
        ..Default::default()
    }
}

fn parse_json(value: &Value) -> BodyDetails {
    let mut details = BodyDetails::default();

    let Some(object) = value.as_object() else {
        if let Some(text) = value.as_str().map(str::trim).filter(|s| !s.is_empty()) {
            details.message = Some(truncate(text));
        }
        return details;
    };

    details.code = object
        .get("code")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut message = object
        .get("message")
        .or_else(|| object.get("detail"))
        .and_then(Value::as_str)
        .map(str::to_string);

    match object.get("error") {
        Some(Value::String(text)) => {
            message.get_or_insert_with(|| text.clone());
        }
        Some(Value::Object(inner)) => {
            if let Some(text) = inner.get("message").and_then(Value::as_str) {
                message.get_or_insert_with(|| text.to_string());
            }
            if details.code.is_none() {
                details.code = inner.get("code").and_then(Value::as_str).map(str::to_string);
            }
        }
        _ => {}
    }

    if let Some(Value::Array(errors)) = object.get("errors") {
        details.fields = errors
            .iter()
            .filter_map(|entry| {
                let message = entry.get("message").and_then(Value::as_str)?;
                let field = entry
                    .get("field")
                    .and_then(Value::as_str)
                    .unwrap_or("general");
                Some(FieldError {
                    field: field.to_string(),
                    message: message.to_string(),
                })
            })
            .collect();
    }

    details.message = message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .map(|m| truncate(&m));
    details
}

fn parse_xml(body: &str) -> BodyDetails {
    BodyDetails {
        code: xml_element(body, "Code"),
        message: xml_element(body, "Message").map(|m| truncate(&m)),
        fields: Vec::new(),
    }
}

fn xml_element(body: &str, name: &str) -> Option<String> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    let text = body[start..end].trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_MESSAGE_LENGTH {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_ERROR_MESSAGE_LENGTH - 3).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_status_is_network() {
        let err = extract_error_message(ErrorSource::Backend, None, "");
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.message, ErrorKind::Network.generic_message());
    }

    #[test]
    fn backend_error_string_envelope() {
        let err = extract_error_message(
            ErrorSource::Backend,
            Some(409),
            r#"{"error": "License number AB123 already registered"}"#,
        );
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.message, "License number AB123 already registered");
    }

    #[test]
    fn backend_nested_error_object() {
        let err = extract_error_message(
            ErrorSource::Backend,
            Some(404),
            r#"{"error": {"code": "DRIVER_NOT_FOUND", "message": "Driver not found"}}"#,
        );
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Driver not found");
    }

    #[test]
    fn backend_field_errors_are_kept() {
        let err = extract_error_message(
            ErrorSource::Backend,
            Some(422),
            r#"{"errors": [{"field": "email", "message": "is taken"}, {"message": "bad"}]}"#,
        );
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.fields.len(), 2);
        assert_eq!(err.fields[1].field, "general");
        assert_eq!(err.message, "email: is taken; general: bad");
    }

    #[test]
    fn storage_expired_policy_xml() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>AccessDenied</Code><Message>Invalid according to Policy: Policy expired.</Message></Error>"#;
        let err = extract_error_message(ErrorSource::Storage, Some(403), body);
        assert_eq!(err.kind, ErrorKind::ExpiredTicket);
        assert_eq!(err.message, "Invalid according to Policy: Policy expired.");
    }

    #[test]
    fn storage_access_denied_without_expiry_is_storage_error() {
        let body = "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>";
        let err = extract_error_message(ErrorSource::Storage, Some(403), body);
        assert_eq!(err.kind, ErrorKind::Storage);
    }

    #[test]
    fn storage_server_errors_are_transient() {
        let err = extract_error_message(ErrorSource::Storage, Some(503), "");
        assert_eq!(err.kind, ErrorKind::Network);
    }

    #[test]
    fn unknown_shapes_degrade_to_generic_message() {
        let err = extract_error_message(ErrorSource::Backend, Some(500), "   ");
        assert_eq!(err.message, ErrorKind::Network.generic_message());

        let err = extract_error_message(ErrorSource::Backend, Some(418), r#"{"foo": 1}"#);
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.message, ErrorKind::Internal.generic_message());

        let err = extract_error_message(ErrorSource::Backend, Some(400), "<html><body>oops");
        assert_eq!(err.message, ErrorKind::Validation.generic_message());
    }

    #[test]
    fn plain_text_is_truncated() {
        let long = "x".repeat(500);
        let err = extract_error_message(ErrorSource::Backend, Some(400), &long);
        assert_eq!(err.message.chars().count(), MAX_ERROR_MESSAGE_LENGTH);
        assert!(err.message.ends_with("..."));
    }
}
