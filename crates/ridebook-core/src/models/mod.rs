//! Data models for the driver-management subsystem
//!
//! `driver` holds the entity and its mutation DTOs, `document` the compliance
//! document types and the upload ticket handed out by the backend.

mod document;
mod driver;

pub use document::*;
pub use driver::*;
