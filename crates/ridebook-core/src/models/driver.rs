use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::document::{DocumentRef, FileType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Active => "active",
            DriverStatus::Inactive => "inactive",
            DriverStatus::Suspended => "suspended",
        }
    }
}

impl Display for DriverStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(DriverStatus::Active),
            "inactive" => Ok(DriverStatus::Inactive),
            "suspended" => Ok(DriverStatus::Suspended),
            _ => Err(anyhow::anyhow!("Invalid driver status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
    #[serde(default)]
    pub license_class: Option<String>,
    pub license_expiry: NaiveDate,
    #[serde(default)]
    pub status: DriverStatus,
    /// Committed compliance documents, at most one per category
    #[serde(default)]
    pub documents: BTreeMap<FileType, DocumentRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn document(&self, file_type: FileType) -> Option<&DocumentRef> {
        self.documents.get(&file_type)
    }
}

/// Payload for creating a driver. All mandatory fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreateDriverDto {
    #[validate(length(min = 1, max = 100, message = "First name must be between 1 and 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be between 1 and 100 characters"))]
    pub last_name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 5, max = 32, message = "Phone must be between 5 and 32 characters"))]
    pub phone: String,
    #[validate(length(min = 3, max = 32, message = "License number must be between 3 and 32 characters"))]
    pub license_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_class: Option<String>,
    pub license_expiry: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DriverStatus>,
}

/// Sparse partial update. Absent fields are left untouched by the backend;
/// `documents` entries are merged per file type and a `null` entry removes
/// that document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UpdateDriverDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "First name must be between 1 and 100 characters"))]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Last name must be between 1 and 100 characters"))]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 5, max = 32, message = "Phone must be between 5 and 32 characters"))]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 32, message = "License number must be between 3 and 32 characters"))]
    pub license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_expiry: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DriverStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<BTreeMap<FileType, Option<DocumentRef>>>,
}

impl UpdateDriverDto {
    /// Update that only attaches one uploaded document.
    pub fn commit_document(file_type: FileType, storage_key: impl Into<String>) -> Self {
        Self::set_document(file_type, Some(DocumentRef::uploaded(file_type, storage_key)))
    }

    /// Update that puts `document` back in place, or removes the entry on `None`.
    pub fn set_document(file_type: FileType, document: Option<DocumentRef>) -> Self {
        let mut documents = BTreeMap::new();
        documents.insert(file_type, document);
        Self {
            documents: Some(documents),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == UpdateDriverDto::default()
    }
}

/// Query for the driver list. Empty filter lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverFilter {
    pub search: Option<String>,
    pub status: Option<DriverStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl DriverFilter {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                query.push(("search", search.to_string()));
            }
        }
        if let Some(status) = self.status {
            query.push(("status", status.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset", offset.to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_dto() -> CreateDriverDto {
        CreateDriverDto {
            first_name: "Ada".to_string(),
            last_name: "Okafor".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+2348012345678".to_string(),
            license_number: "AB123".to_string(),
            license_class: Some("B".to_string()),
            license_expiry: NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
            status: None,
        }
    }

    #[test]
    fn create_dto_validates_fields() {
        assert!(create_dto().validate().is_ok());

        let mut dto = create_dto();
        dto.email = "not-an-email".to_string();
        assert!(dto.validate().is_err());

        let mut dto = create_dto();
        dto.license_number = "A".to_string();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("license_number"));
    }

    #[test]
    fn update_dto_skips_absent_fields() {
        let dto = UpdateDriverDto {
            phone: Some("+15550001111".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json, serde_json::json!({ "phone": "+15550001111" }));
        assert!(dto.validate().is_ok());
        assert!(UpdateDriverDto::default().is_empty());
    }

    #[test]
    fn commit_document_carries_only_the_document() {
        let dto = UpdateDriverDto::commit_document(FileType::Insurance, "drivers/1/ins.pdf");
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "documents": {
                    "insurance": {
                        "file_type": "insurance",
                        "storage_key": "drivers/1/ins.pdf",
                        "status": "uploaded"
                    }
                }
            })
        );
    }

    #[test]
    fn cleared_document_serializes_as_null() {
        let dto = UpdateDriverDto::set_document(FileType::License, None);
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json, serde_json::json!({ "documents": { "license": null } }));
        assert!(!dto.is_empty());
    }

    #[test]
    fn filter_query_omits_blank_search() {
        let filter = DriverFilter {
            search: Some("  ".to_string()),
            status: Some(DriverStatus::Suspended),
            limit: Some(20),
            offset: None,
        };
        assert_eq!(
            filter.to_query(),
            vec![("status", "suspended".to_string()), ("limit", "20".to_string())]
        );
    }
}
