//! Shared key generation for driver documents.

use ridebook_core::models::FileType;
use uuid::Uuid;

/// Generate a storage key for one document object.
///
/// Every upload attempt gets a fresh object id so that a superseded attempt can
/// never overwrite the object of a newer one.
pub fn generate_document_key(driver_id: Uuid, file_type: FileType) -> String {
    format!("drivers/{}/{}/{}", driver_id, file_type, Uuid::new_v4())
}
