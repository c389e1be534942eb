//! Driver workflow controller
//!
//! Runs the row and field state machines around the registry and the upload
//! coordinator. State locks guard single reads and writes and are never held
//! across an `.await`; the only lock held across an await is the per-field
//! commit lock, which orders commits of one field.

use crate::confirm::Confirmation;
use crate::coordinator::DocumentUploadCoordinator;
use crate::feedback::FeedbackPublisher;
use crate::registry::DriverRegistry;
use crate::state::{FieldMachine, FieldState, RowKey, RowState, StateError};
use ridebook_core::models::{
    CreateDriverDto, DocumentFile, DocumentRef, Driver, DriverFilter, FileType, UpdateDriverDto,
};
use ridebook_core::{get_file_type, AppError, ErrorKind, ValidationGate};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;
use validator::Validate;

type FieldKey = (Uuid, FileType);

/// Result of one upload attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The document was committed; carries the updated driver.
    Completed(Driver),
    /// A newer selection (or an abandon) took over the field. This attempt's
    /// result was discarded and did not touch the field state.
    Superseded,
}

pub struct DriverWorkflowController {
    registry: Arc<DriverRegistry>,
    coordinator: DocumentUploadCoordinator,
    gate: ValidationGate,
    confirmation: Arc<dyn Confirmation>,
    feedback: FeedbackPublisher,
    rows: Mutex<HashMap<RowKey, RowState>>,
    fields: Mutex<HashMap<FieldKey, FieldMachine>>,
    commit_locks: Mutex<HashMap<FieldKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl DriverWorkflowController {
    pub fn new(
        registry: Arc<DriverRegistry>,
        coordinator: DocumentUploadCoordinator,
        gate: ValidationGate,
        confirmation: Arc<dyn Confirmation>,
        feedback: FeedbackPublisher,
    ) -> Self {
        Self {
            registry,
            coordinator,
            gate,
            confirmation,
            feedback,
            rows: Mutex::new(HashMap::new()),
            fields: Mutex::new(HashMap::new()),
            commit_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    fn rows(&self) -> MutexGuard<'_, HashMap<RowKey, RowState>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fields(&self) -> MutexGuard<'_, HashMap<FieldKey, FieldMachine>> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit_lock(&self, key: FieldKey) -> Arc<tokio::sync::Mutex<()>> {
        self.commit_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .clone()
    }

    pub fn row_state(&self, row: RowKey) -> RowState {
        self.rows().get(&row).cloned().unwrap_or_default()
    }

    pub fn field_state(&self, driver_id: Uuid, file_type: FileType) -> FieldState {
        self.fields()
            .get(&(driver_id, file_type))
            .map(|machine| machine.state().clone())
            .unwrap_or_default()
    }

    // ===== Row lifecycle =====

    pub fn begin_edit(&self, row: RowKey) -> Result<(), AppError> {
        let mut rows = self.rows();
        let state = rows.entry(row).or_default();
        match state {
            RowState::Submitting => Err(busy()),
            RowState::Editing { .. } => Ok(()),
            RowState::Idle => {
                *state = RowState::Editing { error: None };
                Ok(())
            }
        }
    }

    pub fn cancel_edit(&self, row: RowKey) -> Result<(), AppError> {
        let mut rows = self.rows();
        if rows.get(&row).is_some_and(RowState::is_submitting) {
            return Err(busy());
        }
        rows.remove(&row);
        Ok(())
    }

    /// Move the row to `Submitting` after checking the DTO.
    ///
    /// Refused with `Busy` while a submission is pending. A DTO that fails
    /// validation leaves the row in `Editing` with the error attached.
    fn enter_submitting(
        &self,
        row: RowKey,
        check: impl FnOnce() -> Result<(), AppError>,
    ) -> Result<(), AppError> {
        let mut rows = self.rows();
        let state = rows.entry(row).or_default();
        if state.is_submitting() {
            return Err(busy());
        }
        if let Err(err) = check() {
            *state = RowState::Editing {
                error: Some(StateError::from(&err)),
            };
            return Err(err);
        }
        *state = RowState::Submitting;
        Ok(())
    }

    fn finish_row(&self, row: RowKey, result: Result<(), &AppError>) {
        let mut rows = self.rows();
        match result {
            Ok(()) => {
                rows.remove(&row);
            }
            Err(err) => {
                rows.insert(
                    row,
                    RowState::Editing {
                        error: Some(StateError::from(err)),
                    },
                );
            }
        }
    }

    #[tracing::instrument(skip(self, dto), fields(license_number = %dto.license_number))]
    pub async fn submit_create(&self, dto: &CreateDriverDto) -> Result<Driver, AppError> {
        let row = RowKey::New;
        if let Err(err) = self.enter_submitting(row, || dto.validate().map_err(AppError::from)) {
            self.feedback.error(&err);
            return Err(err);
        }

        match self.registry.create_driver(dto).await {
            Ok(driver) => {
                self.finish_row(row, Ok(()));
                self.feedback
                    .success(format!("Driver {} created", driver.full_name()));
                Ok(driver)
            }
            Err(err) => {
                self.finish_row(row, Err(&err));
                self.feedback.error(&err);
                Err(err)
            }
        }
    }

    #[tracing::instrument(skip(self, dto), fields(driver_id = %id))]
    pub async fn submit_update(&self, id: Uuid, dto: &UpdateDriverDto) -> Result<Driver, AppError> {
        let row = RowKey::Existing(id);
        let check = || {
            if dto.is_empty() {
                return Err(AppError::Validation {
                    message: "There are no changes to save".to_string(),
                    fields: Vec::new(),
                });
            }
            dto.validate().map_err(AppError::from)
        };
        if let Err(err) = self.enter_submitting(row, check) {
            self.feedback.error(&err);
            return Err(err);
        }

        match self.registry.update_driver(id, dto).await {
            Ok(driver) => {
                self.finish_row(row, Ok(()));
                self.feedback
                    .success(format!("Driver {} updated", driver.full_name()));
                Ok(driver)
            }
            Err(err) => {
                self.finish_row(row, Err(&err));
                self.feedback.error(&err);
                if err.kind() == ErrorKind::NotFound {
                    self.refresh_after_stale_reference().await;
                }
                Err(err)
            }
        }
    }

    /// Delete after explicit confirmation. Returns `Ok(false)` when the user declined.
    #[tracing::instrument(skip(self), fields(driver_id = %id))]
    pub async fn request_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let row = RowKey::Existing(id);
        if self.row_state(row).is_submitting() {
            let err = busy();
            self.feedback.error(&err);
            return Err(err);
        }

        let label = self
            .registry
            .find(id)
            .map(|driver| driver.full_name())
            .unwrap_or_else(|| id.to_string());
        if !self.confirmation.confirm_delete(id, &label).await {
            tracing::debug!("Delete declined");
            return Ok(false);
        }

        if let Err(err) = self.enter_submitting(row, || Ok(())) {
            self.feedback.error(&err);
            return Err(err);
        }

        match self.registry.delete_driver(id).await {
            Ok(()) => {
                self.rows().remove(&row);
                self.feedback.success(format!("Driver {} deleted", label));
                Ok(true)
            }
            Err(err) => {
                self.rows().remove(&row);
                self.feedback.error(&err);
                if err.kind() == ErrorKind::NotFound {
                    self.refresh_after_stale_reference().await;
                }
                Err(err)
            }
        }
    }

    /// Reload the list. Only failures are published.
    pub async fn refresh(&self, filter: &DriverFilter) -> Result<Vec<Driver>, AppError> {
        self.registry.get_drivers(filter).await.inspect_err(|err| {
            self.feedback.error(err);
        })
    }

    /// A stale id means the local view is out of date. The error for the
    /// original operation was already published, so a failed reload is only logged.
    async fn refresh_after_stale_reference(&self) {
        if let Err(e) = self.registry.get_drivers(&DriverFilter::default()).await {
            tracing::warn!(error = %e, "List refresh after stale reference failed");
        }
    }

    // ===== Document fields =====

    /// Validate `file` for the field and run the whole upload flow.
    ///
    /// A file that fails validation is never accepted: no network call is made
    /// and the field machine is left as it was. An accepted file supersedes
    /// whatever attempt was in flight for the same field.
    ///
    /// # Panics
    ///
    /// On a `field_id` that is not a known document field.
    #[tracing::instrument(skip(self, file), fields(driver_id = %driver_id, file_name = %file.file_name))]
    pub async fn upload_document(
        &self,
        driver_id: Uuid,
        field_id: &str,
        file: DocumentFile,
    ) -> Result<UploadOutcome, AppError> {
        let file_type = get_file_type(field_id);
        if let Err(e) = self.gate.validate_file(&file, file_type) {
            let err = AppError::from(e);
            tracing::debug!(error = %err, "File rejected before upload");
            self.feedback.error(&err);
            return Err(err);
        }

        let key = (driver_id, file_type);
        let generation = {
            let mut fields = self.fields();
            let machine = fields.entry(key).or_default();
            let generation = machine.select(file.clone());
            machine.advance(generation, FieldState::RequestingTicket);
            generation
        };

        self.run_upload(key, generation, file).await
    }

    /// Restart a failed field from ticket issuance with the last validated file.
    #[tracing::instrument(skip(self), fields(driver_id = %driver_id, file_type = %file_type))]
    pub async fn retry_upload(
        &self,
        driver_id: Uuid,
        file_type: FileType,
    ) -> Result<UploadOutcome, AppError> {
        let key = (driver_id, file_type);
        let restarted = match self.fields().get_mut(&key) {
            Some(machine) => machine.restart(),
            None => FieldMachine::default().restart(),
        };
        let (generation, file) = match restarted {
            Ok(restarted) => restarted,
            Err(err) => {
                self.feedback.error(&err);
                return Err(err);
            }
        };

        self.run_upload(key, generation, file).await
    }

    /// Cancel the field cooperatively. In-flight results will be ignored.
    pub fn abandon_field(&self, driver_id: Uuid, file_type: FileType) {
        if let Some(machine) = self.fields().get_mut(&(driver_id, file_type)) {
            machine.abandon();
        }
    }

    fn advance(&self, key: FieldKey, generation: u64, next: FieldState) -> bool {
        self.fields()
            .get_mut(&key)
            .is_some_and(|machine| machine.advance(generation, next))
    }

    /// Ticket, direct upload, commit. Expects the field in `RequestingTicket`
    /// for `generation`.
    async fn run_upload(
        &self,
        key: FieldKey,
        generation: u64,
        file: DocumentFile,
    ) -> Result<UploadOutcome, AppError> {
        let (driver_id, file_type) = key;

        let ticket = match self
            .coordinator
            .get_document_upload_url(driver_id, file_type)
            .await
        {
            Ok(ticket) => ticket,
            Err(err) => return self.fail_field(key, generation, err).await,
        };
        if !self.advance(key, generation, FieldState::Uploading) {
            return Ok(superseded(key));
        }

        let storage_key = match self.coordinator.upload_file_to_s3(&ticket, &file).await {
            Ok(storage_key) => storage_key,
            Err(err) => return self.fail_field(key, generation, err).await,
        };

        let commit_lock = self.commit_lock(key);
        let _commit_guard = commit_lock.lock().await;
        if !self.advance(key, generation, FieldState::Committing) {
            return Ok(superseded(key));
        }

        let previous = self
            .registry
            .find(driver_id)
            .and_then(|driver| driver.document(file_type).cloned());
        let dto = UpdateDriverDto::commit_document(file_type, storage_key.clone());
        let committed = self
            .registry
            .update_driver_if(driver_id, &dto, |_| {
                self.advance(key, generation, FieldState::Uploaded { storage_key })
            })
            .await;
        let driver = match committed {
            Ok(Some(driver)) => driver,
            Ok(None) => {
                // Superseded mid-commit. The write already landed, so put the
                // field back before releasing the lock to any newer commit.
                self.revert_commit(driver_id, file_type, previous).await;
                return Ok(superseded(key));
            }
            Err(err) => return self.fail_field(key, generation, err).await,
        };

        self.feedback.success(format!(
            "{} uploaded for {}",
            file_type.label(),
            driver.full_name()
        ));
        Ok(UploadOutcome::Completed(driver))
    }

    /// Restore the document entry a superseded commit overwrote. Must run under
    /// the field's commit lock.
    async fn revert_commit(
        &self,
        driver_id: Uuid,
        file_type: FileType,
        previous: Option<DocumentRef>,
    ) {
        let dto = UpdateDriverDto::set_document(file_type, previous);
        match self.registry.update_driver(driver_id, &dto).await {
            Ok(_) => tracing::debug!(file_type = %file_type, "Reverted superseded commit"),
            Err(e) => tracing::warn!(
                error = %e,
                file_type = %file_type,
                "Failed to revert superseded commit"
            ),
        }
    }

    async fn fail_field(
        &self,
        key: FieldKey,
        generation: u64,
        err: AppError,
    ) -> Result<UploadOutcome, AppError> {
        if !self.advance(key, generation, FieldState::Failed(StateError::from(&err))) {
            tracing::debug!(error = %err, "Discarding failure of superseded upload");
            return Ok(superseded(key));
        }

        self.feedback.error(&err);
        if err.kind() == ErrorKind::NotFound {
            self.refresh_after_stale_reference().await;
        }
        Err(err)
    }
}

fn busy() -> AppError {
    AppError::Busy("A submission is already in progress for this driver".to_string())
}

fn superseded((driver_id, file_type): FieldKey) -> UploadOutcome {
    tracing::debug!(driver_id = %driver_id, file_type = %file_type, "Upload superseded");
    UploadOutcome::Superseded
}
