use ridebook_api_client::DriverBackend;
use ridebook_core::models::{DocumentFile, FileType, UploadTicket};
use ridebook_core::AppError;
use ridebook_storage::DirectUploader;
use std::sync::Arc;
use uuid::Uuid;

/// Two-phase document upload: ticket issuance, then a direct write to the
/// object store.
///
/// The coordinator never retries and never commits. A successful upload only
/// yields a storage key; attaching it to the driver is the caller's job.
#[derive(Clone)]
pub struct DocumentUploadCoordinator {
    backend: Arc<dyn DriverBackend>,
    uploader: Arc<dyn DirectUploader>,
}

impl DocumentUploadCoordinator {
    pub fn new(backend: Arc<dyn DriverBackend>, uploader: Arc<dyn DirectUploader>) -> Self {
        Self { backend, uploader }
    }

    /// Step one: ask the backend for a single-use ticket scoped to `(driver_id, file_type)`.
    #[tracing::instrument(skip(self), fields(driver_id = %driver_id, file_type = %file_type))]
    pub async fn get_document_upload_url(
        &self,
        driver_id: Uuid,
        file_type: FileType,
    ) -> Result<UploadTicket, AppError> {
        let ticket = self.backend.issue_upload_ticket(driver_id, file_type).await?;

        if ticket.driver_id != driver_id || ticket.file_type != file_type {
            return Err(AppError::Internal(format!(
                "Upload ticket scoped to {}/{} was returned for {}/{}",
                ticket.driver_id, ticket.file_type, driver_id, file_type
            )));
        }

        tracing::debug!(
            storage_key = %ticket.storage_key,
            expires_at = %ticket.expires_at,
            form_upload = ticket.uses_form_upload(),
            "Upload ticket issued"
        );
        Ok(ticket)
    }

    /// Step two: write the file bytes straight to the store with the ticket.
    ///
    /// Returns the storage key. An expired or already used ticket surfaces as
    /// `AppError::ExpiredTicket`; the only way forward is a new ticket.
    #[tracing::instrument(
        skip(self, ticket, file),
        fields(
            storage_key = %ticket.storage_key,
            backend = self.uploader.backend_name(),
            size = file.size()
        )
    )]
    pub async fn upload_file_to_s3(
        &self,
        ticket: &UploadTicket,
        file: &DocumentFile,
    ) -> Result<String, AppError> {
        match self.uploader.upload(ticket, file).await {
            Ok(storage_key) => {
                tracing::info!("Document stored");
                Ok(storage_key)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Direct upload failed");
                Err(e.into())
            }
        }
    }
}
