//! Ridebook Storage Library
//!
//! Step two of the document upload protocol: writing file bytes straight to the
//! object store with a backend-issued [`UploadTicket`](ridebook_core::models::UploadTicket).
//! The application backend never sees the payload.
//!
//! # Storage key format
//!
//! Keys are driver-scoped: `drivers/{driver_id}/{file_type}/{object_id}`. The backend
//! mints them when it issues a ticket; the in-memory store uses the same layout
//! through the `keys` module.

pub(crate) mod keys;
pub mod memory;
pub mod presigned;
pub mod traits;

// Re-export commonly used types
pub use memory::{Clock, MemoryObjectStore};
pub use presigned::PresignedUploader;
pub use traits::{DirectUploader, StorageError, StorageResult};
