//! Driver endpoints of the Ridebook API.
//!
//! Entity types come from `ridebook_core::models`; the ticket wire shape is
//! defined here because the backend does not echo the `(driver, file type)` scope.

use crate::backend::DriverBackend;
use crate::ApiClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ridebook_core::models::{
    CreateDriverDto, Driver, DriverFilter, FileType, UpdateDriverDto, UploadTicket,
    UploadTicketRequest,
};
use ridebook_core::AppError;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Ticket as returned by `POST /drivers/{id}/documents/upload-url`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct UploadTicketResponse {
    pub storage_key: String,
    pub upload_url: String,
    #[serde(default)]
    pub required_fields: BTreeMap<String, String>,
    pub expires_at: DateTime<Utc>,
}

impl UploadTicketResponse {
    pub fn into_ticket(self, driver_id: Uuid, file_type: FileType) -> UploadTicket {
        UploadTicket {
            driver_id,
            file_type,
            storage_key: self.storage_key,
            upload_url: self.upload_url,
            required_fields: self.required_fields,
            expires_at: self.expires_at,
        }
    }
}

#[async_trait]
impl DriverBackend for ApiClient {
    async fn list_drivers(&self, filter: &DriverFilter) -> Result<Vec<Driver>, AppError> {
        self.get("/drivers", &filter.to_query()).await
    }

    async fn create_driver(&self, dto: &CreateDriverDto) -> Result<Driver, AppError> {
        self.post_json("/drivers", dto).await
    }

    async fn update_driver(&self, id: Uuid, dto: &UpdateDriverDto) -> Result<Driver, AppError> {
        self.patch_json(&format!("/drivers/{}", id), dto).await
    }

    async fn delete_driver(&self, id: Uuid) -> Result<(), AppError> {
        self.delete(&format!("/drivers/{}", id)).await
    }

    async fn issue_upload_ticket(
        &self,
        driver_id: Uuid,
        file_type: FileType,
    ) -> Result<UploadTicket, AppError> {
        let response: UploadTicketResponse = self
            .post_json(
                &format!("/drivers/{}/documents/upload-url", driver_id),
                &UploadTicketRequest { file_type },
            )
            .await?;
        Ok(response.into_ticket(driver_id, file_type))
    }
}
