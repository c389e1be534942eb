use crate::traits::{DirectUploader, StorageError, StorageResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use ridebook_core::models::{DocumentFile, UploadTicket};
use ridebook_core::{extract_error_message, ClientConfig, ErrorSource};
use std::time::Duration;

/// Uploader for S3-style signed URLs.
///
/// Tickets with `required_fields` are sent as a POST-policy multipart form;
/// tickets without are sent as a presigned PUT of the raw bytes.
#[derive(Clone, Debug)]
pub struct PresignedUploader {
    client: Client,
}

impl PresignedUploader {
    pub fn new(timeout: Duration) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ClientConfig) -> StorageResult<Self> {
        Self::new(config.upload_timeout())
    }

    fn build_form(ticket: &UploadTicket, file: &DocumentFile) -> StorageResult<Form> {
        // Policy fields must precede the file part.
        let form = ticket
            .required_fields
            .iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            })
            .text("Content-Type", file.content_type.clone());

        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| StorageError::Rejected(format!("Invalid content type: {}", e)))?;

        Ok(form.part("file", part))
    }
}

#[async_trait]
impl DirectUploader for PresignedUploader {
    #[tracing::instrument(
        skip(self, ticket, file),
        fields(
            driver_id = %ticket.driver_id,
            file_type = %ticket.file_type,
            storage_key = %ticket.storage_key,
            size = file.size(),
            operation = "direct_upload"
        )
    )]
    async fn upload(&self, ticket: &UploadTicket, file: &DocumentFile) -> StorageResult<String> {
        let request = if ticket.uses_form_upload() {
            self.client
                .post(&ticket.upload_url)
                .multipart(Self::build_form(ticket, file)?)
        } else {
            self.client
                .put(&ticket.upload_url)
                .header(CONTENT_TYPE, file.content_type.as_str())
                .body(file.bytes.clone())
        };

        let start = std::time::Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    timeout = e.is_timeout(),
                    "Direct upload did not reach the store"
                );
                return Err(extract_error_message(ErrorSource::Storage, None, "").into());
            }
        };

        let status = response.status();
        if status.is_success() {
            tracing::info!(
                duration_ms = start.elapsed().as_millis() as u64,
                "Direct upload stored"
            );
            return Ok(ticket.storage_key.clone());
        }

        let body = response.text().await.unwrap_or_default();
        let extracted = extract_error_message(ErrorSource::Storage, Some(status.as_u16()), &body);
        tracing::warn!(
            status = status.as_u16(),
            kind = %extracted.kind,
            message = %extracted.message,
            "Direct upload rejected by the store"
        );
        Err(extracted.into())
    }

    fn backend_name(&self) -> &'static str {
        "presigned-http"
    }
}
