//! Two-phase upload coordinator tests.
//!
//! Run with: `cargo test -p ridebook-drivers --test coordinator_test`

mod common;

use common::{pdf, FakeBackend, MB};
use ridebook_core::models::FileType;
use ridebook_core::{AppError, ErrorKind};
use ridebook_drivers::DocumentUploadCoordinator;
use ridebook_storage::{MemoryObjectStore, StorageError};
use std::sync::Arc;
use uuid::Uuid;

fn coordinator() -> (DocumentUploadCoordinator, Arc<FakeBackend>, Arc<MemoryObjectStore>) {
    let store = Arc::new(MemoryObjectStore::new());
    let backend = Arc::new(FakeBackend::new(store.clone()));
    (
        DocumentUploadCoordinator::new(backend.clone(), store.clone()),
        backend,
        store,
    )
}

#[tokio::test]
async fn test_ticket_is_scoped_to_driver_and_type() {
    let (coordinator, backend, _) = coordinator();
    let driver = backend.seed("LIC-100");

    let ticket = coordinator
        .get_document_upload_url(driver.id, FileType::VehicleRegistration)
        .await
        .unwrap();

    assert_eq!(ticket.driver_id, driver.id);
    assert_eq!(ticket.file_type, FileType::VehicleRegistration);
    assert!(ticket.expires_at > chrono::Utc::now());
}

#[tokio::test]
async fn test_ticket_for_unknown_driver_is_not_found() {
    let (coordinator, _, _) = coordinator();

    let err = coordinator
        .get_document_upload_url(Uuid::new_v4(), FileType::License)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_upload_returns_storage_key_without_commit() {
    let (coordinator, backend, store) = coordinator();
    let driver = backend.seed("LIC-101");
    let ticket = coordinator
        .get_document_upload_url(driver.id, FileType::License)
        .await
        .unwrap();

    let key = coordinator
        .upload_file_to_s3(&ticket, &pdf("license.pdf", MB))
        .await
        .unwrap();

    assert_eq!(key, ticket.storage_key);
    assert!(store.contains(&key));
    assert!(backend.update_calls().is_empty());
    assert!(backend.driver(driver.id).unwrap().documents.is_empty());
}

#[tokio::test]
async fn test_used_ticket_cannot_be_replayed() {
    let (coordinator, backend, _) = coordinator();
    let driver = backend.seed("LIC-102");
    let ticket = coordinator
        .get_document_upload_url(driver.id, FileType::Identity)
        .await
        .unwrap();
    let file = pdf("id.pdf", MB);

    coordinator.upload_file_to_s3(&ticket, &file).await.unwrap();
    let err = coordinator.upload_file_to_s3(&ticket, &file).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExpiredTicket);
}

#[tokio::test]
async fn test_transient_failure_is_reported_not_retried() {
    let (coordinator, backend, store) = coordinator();
    let driver = backend.seed("LIC-103");
    let ticket = coordinator
        .get_document_upload_url(driver.id, FileType::Insurance)
        .await
        .unwrap();
    store.fail_next(StorageError::Network("connection reset".to_string()));

    let err = coordinator
        .upload_file_to_s3(&ticket, &pdf("policy.pdf", MB))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(store.is_empty());
    assert_eq!(
        backend.calls(),
        vec!["issue_upload_ticket".to_string()]
    );
}
