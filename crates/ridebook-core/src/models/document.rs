use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use crate::constants::{
    DEFAULT_IDENTITY_MAX_MB, DEFAULT_INSURANCE_MAX_MB, DEFAULT_LICENSE_MAX_MB,
    DEFAULT_VEHICLE_REGISTRATION_MAX_MB, MIB,
};

const PDF_AND_IMAGES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];
const PDF_AND_WEB_IMAGES: &[&str] = &["application/pdf", "image/jpeg", "image/png", "image/webp"];

/// Compliance document category.
///
/// Each category carries its own MIME allow-list and default size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    License,
    Insurance,
    Identity,
    VehicleRegistration,
}

impl FileType {
    pub const ALL: [FileType; 4] = [
        FileType::License,
        FileType::Insurance,
        FileType::Identity,
        FileType::VehicleRegistration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::License => "license",
            FileType::Insurance => "insurance",
            FileType::Identity => "identity",
            FileType::VehicleRegistration => "vehicle_registration",
        }
    }

    /// Human readable name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            FileType::License => "License document",
            FileType::Insurance => "Insurance document",
            FileType::Identity => "Identity document",
            FileType::VehicleRegistration => "Vehicle registration document",
        }
    }

    /// Identifier of the form field that collects this document.
    pub fn field_id(&self) -> &'static str {
        match self {
            FileType::License => "license_document",
            FileType::Insurance => "insurance_document",
            FileType::Identity => "identity_document",
            FileType::VehicleRegistration => "vehicle_registration_document",
        }
    }

    /// Fallible field lookup for untrusted input. See `validation::get_file_type`
    /// for the total variant used with compile-time known field ids.
    pub fn from_field_id(field_id: &str) -> Option<FileType> {
        FileType::ALL
            .into_iter()
            .find(|file_type| file_type.field_id() == field_id)
    }

    pub fn allowed_content_types(&self) -> &'static [&'static str] {
        match self {
            FileType::License | FileType::Insurance | FileType::Identity => PDF_AND_IMAGES,
            FileType::VehicleRegistration => PDF_AND_WEB_IMAGES,
        }
    }

    pub fn default_max_size_bytes(&self) -> u64 {
        let mb = match self {
            FileType::License => DEFAULT_LICENSE_MAX_MB,
            FileType::Insurance => DEFAULT_INSURANCE_MAX_MB,
            FileType::Identity => DEFAULT_IDENTITY_MAX_MB,
            FileType::VehicleRegistration => DEFAULT_VEHICLE_REGISTRATION_MAX_MB,
        };
        mb * MIB
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        FileType::ALL
            .into_iter()
            .find(|file_type| file_type.as_str() == normalized)
            .ok_or_else(|| anyhow::anyhow!("Invalid file type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Uploaded,
    Failed,
}

/// Reference to a stored document attached to a driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub file_type: FileType,
    pub storage_key: String,
    pub status: DocumentStatus,
}

impl DocumentRef {
    pub fn uploaded(file_type: FileType, storage_key: impl Into<String>) -> Self {
        Self {
            file_type,
            storage_key: storage_key.into(),
            status: DocumentStatus::Uploaded,
        }
    }
}

/// Request body for ticket issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTicketRequest {
    pub file_type: FileType,
}

/// Single-use, short-lived credential for one direct write to object storage.
///
/// Scoped to one `(driver_id, file_type)` pair. A ticket that expired or was
/// already used is inert: the only way forward is a fresh ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTicket {
    pub driver_id: Uuid,
    pub file_type: FileType,
    /// Key the object will be stored under
    pub storage_key: String,
    /// Signed URL for the direct write
    pub upload_url: String,
    /// Form fields for POST-policy uploads. Empty for presigned PUT.
    #[serde(default)]
    pub required_fields: BTreeMap<String, String>,
    pub expires_at: DateTime<Utc>,
}

impl UploadTicket {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn uses_form_upload(&self) -> bool {
        !self.required_fields.is_empty()
    }
}

/// Raw file as supplied by a file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl DocumentFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
