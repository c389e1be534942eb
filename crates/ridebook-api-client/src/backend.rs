//! Backend seam for driver records and ticket issuance.

use async_trait::async_trait;
use ridebook_core::models::{
    CreateDriverDto, Driver, DriverFilter, FileType, UpdateDriverDto, UploadTicket,
};
use ridebook_core::AppError;
use uuid::Uuid;

/// Operations the application backend offers for driver management.
///
/// [`ApiClient`](crate::ApiClient) implements this over HTTP. Errors are already
/// normalized into `AppError` kinds.
#[async_trait]
pub trait DriverBackend: Send + Sync {
    async fn list_drivers(&self, filter: &DriverFilter) -> Result<Vec<Driver>, AppError>;

    /// Fails with `Validation` (field checks) or `Conflict` (duplicate license number).
    async fn create_driver(&self, dto: &CreateDriverDto) -> Result<Driver, AppError>;

    /// Partial update. Fails with `NotFound` or `Conflict`.
    async fn update_driver(&self, id: Uuid, dto: &UpdateDriverDto) -> Result<Driver, AppError>;

    /// Not idempotent: deleting an unknown id fails with `NotFound`.
    async fn delete_driver(&self, id: Uuid) -> Result<(), AppError>;

    /// Mint a single-use upload ticket for one `(driver, file type)` pair.
    /// Fails with `Auth`, `NotFound` (unknown driver) or `RateLimited`.
    async fn issue_upload_ticket(
        &self,
        driver_id: Uuid,
        file_type: FileType,
    ) -> Result<UploadTicket, AppError>;
}
