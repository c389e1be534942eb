//! In-process fakes for workflow tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use ridebook_api_client::DriverBackend;
use ridebook_core::models::{
    CreateDriverDto, DocumentFile, Driver, DriverFilter, FileType, UpdateDriverDto, UploadTicket,
};
use ridebook_core::{AppError, ErrorKind, ExtractedError, ValidationGate};
use ridebook_drivers::{
    AutoConfirm, Confirmation, DocumentUploadCoordinator, DriverRegistry,
    DriverWorkflowController, FeedbackEvent, FeedbackPublisher, FeedbackReceiver,
};
use ridebook_storage::{DirectUploader, MemoryObjectStore, StorageResult};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

pub const MB: usize = 1024 * 1024;

#[derive(Default)]
struct BackendState {
    drivers: BTreeMap<Uuid, Driver>,
    calls: Vec<String>,
    update_calls: Vec<(Uuid, UpdateDriverDto)>,
    ticket_failures: VecDeque<ErrorKind>,
    ticket_ttl: Option<Duration>,
    create_gate: Option<Arc<Gate>>,
    update_gate: Option<Arc<Gate>>,
}

/// Backend fake with the same contract as the HTTP API. Tickets are minted by
/// the shared in-memory object store.
pub struct FakeBackend {
    state: Mutex<BackendState>,
    store: Arc<MemoryObjectStore>,
}

fn error(kind: ErrorKind, message: impl Into<String>) -> AppError {
    AppError::from(ExtractedError {
        kind,
        message: message.into(),
        fields: Vec::new(),
    })
}

impl FakeBackend {
    pub fn new(store: Arc<MemoryObjectStore>) -> Self {
        Self {
            state: Mutex::new(BackendState::default()),
            store,
        }
    }

    pub fn seed(&self, license_number: &str) -> Driver {
        let now = Utc::now();
        let driver = Driver {
            id: Uuid::new_v4(),
            first_name: "Seeded".to_string(),
            last_name: license_number.to_string(),
            email: format!("{}@example.com", license_number.to_lowercase()),
            phone: "+15550000000".to_string(),
            license_number: license_number.to_string(),
            license_class: None,
            license_expiry: NaiveDate::from_ymd_opt(2031, 6, 30).unwrap(),
            status: Default::default(),
            documents: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .drivers
            .insert(driver.id, driver.clone());
        driver
    }

    pub fn insert(&self, driver: Driver) {
        self.state.lock().unwrap().drivers.insert(driver.id, driver);
    }

    pub fn driver(&self, id: Uuid) -> Option<Driver> {
        self.state.lock().unwrap().drivers.get(&id).cloned()
    }

    pub fn remove(&self, id: Uuid) {
        self.state.lock().unwrap().drivers.remove(&id);
    }

    /// Every backend call so far, as `"<operation>"` strings.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn update_calls(&self) -> Vec<(Uuid, UpdateDriverDto)> {
        self.state.lock().unwrap().update_calls.clone()
    }

    pub fn fail_next_ticket(&self, kind: ErrorKind) {
        self.state.lock().unwrap().ticket_failures.push_back(kind);
    }

    pub fn set_ticket_ttl(&self, ttl: Duration) {
        self.state.lock().unwrap().ticket_ttl = Some(ttl);
    }

    /// Hold `create_driver` calls until the returned gate is released.
    pub fn hold_creates(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.state.lock().unwrap().create_gate = Some(gate.clone());
        gate
    }

    /// Hold the next `update_driver` call until the returned gate is released.
    /// Later updates go through.
    pub fn hold_next_update(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.state.lock().unwrap().update_gate = Some(gate.clone());
        gate
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

#[async_trait]
impl DriverBackend for FakeBackend {
    async fn list_drivers(&self, filter: &DriverFilter) -> Result<Vec<Driver>, AppError> {
        self.record("list_drivers");
        let state = self.state.lock().unwrap();
        Ok(state
            .drivers
            .values()
            .filter(|d| filter.status.map_or(true, |s| d.status == s))
            .cloned()
            .collect())
    }

    async fn create_driver(&self, dto: &CreateDriverDto) -> Result<Driver, AppError> {
        self.record("create_driver");
        let gate = self.state.lock().unwrap().create_gate.clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        if state
            .drivers
            .values()
            .any(|d| d.license_number == dto.license_number)
        {
            return Err(error(
                ErrorKind::Conflict,
                format!(
                    "A driver with license number {} already exists",
                    dto.license_number
                ),
            ));
        }

        let now = Utc::now();
        let driver = Driver {
            id: Uuid::new_v4(),
            first_name: dto.first_name.clone(),
            last_name: dto.last_name.clone(),
            email: dto.email.clone(),
            phone: dto.phone.clone(),
            license_number: dto.license_number.clone(),
            license_class: dto.license_class.clone(),
            license_expiry: dto.license_expiry,
            status: dto.status.unwrap_or_default(),
            documents: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        };
        state.drivers.insert(driver.id, driver.clone());
        Ok(driver)
    }

    async fn update_driver(&self, id: Uuid, dto: &UpdateDriverDto) -> Result<Driver, AppError> {
        self.record("update_driver");
        let gate = self.state.lock().unwrap().update_gate.take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        state.update_calls.push((id, dto.clone()));
        let Some(driver) = state.drivers.get_mut(&id) else {
            return Err(error(ErrorKind::NotFound, "Driver not found"));
        };

        if let Some(phone) = &dto.phone {
            driver.phone = phone.clone();
        }
        if let Some(email) = &dto.email {
            driver.email = email.clone();
        }
        if let Some(status) = dto.status {
            driver.status = status;
        }
        for (file_type, document) in dto.documents.iter().flatten() {
            match document {
                Some(document) => driver.documents.insert(*file_type, document.clone()),
                None => driver.documents.remove(file_type),
            };
        }
        driver.updated_at = Utc::now();
        Ok(driver.clone())
    }

    async fn delete_driver(&self, id: Uuid) -> Result<(), AppError> {
        self.record("delete_driver");
        match self.state.lock().unwrap().drivers.remove(&id) {
            Some(_) => Ok(()),
            None => Err(error(ErrorKind::NotFound, "Driver not found")),
        }
    }

    async fn issue_upload_ticket(
        &self,
        driver_id: Uuid,
        file_type: FileType,
    ) -> Result<UploadTicket, AppError> {
        self.record("issue_upload_ticket");
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.ticket_failures.pop_front() {
            return Err(error(kind, kind.generic_message()));
        }
        if !state.drivers.contains_key(&driver_id) {
            return Err(error(ErrorKind::NotFound, "Driver not found"));
        }
        let ttl = state.ticket_ttl.unwrap_or_else(|| Duration::minutes(15));
        Ok(self.store.issue_ticket(driver_id, file_type, ttl))
    }
}

/// Uploader that can hold a write until the test releases it.
pub struct GatedUploader {
    inner: Arc<MemoryObjectStore>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
}

#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl GatedUploader {
    pub fn new(inner: Arc<MemoryObjectStore>) -> Self {
        Self {
            inner,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Hold uploads of files named `file_name` until `release` is notified.
    pub fn gate(&self, file_name: &str) -> Arc<Gate> {
        self.gates
            .lock()
            .unwrap()
            .entry(file_name.to_string())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl DirectUploader for GatedUploader {
    async fn upload(&self, ticket: &UploadTicket, file: &DocumentFile) -> StorageResult<String> {
        let gate = self.gates.lock().unwrap().get(&file.file_name).cloned();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.inner.upload(ticket, file).await
    }

    fn backend_name(&self) -> &'static str {
        "gated-memory"
    }
}

pub struct Harness {
    pub controller: DriverWorkflowController,
    pub backend: Arc<FakeBackend>,
    pub store: Arc<MemoryObjectStore>,
    pub uploader: Arc<GatedUploader>,
    pub feedback: FeedbackReceiver,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(Arc::new(MemoryObjectStore::new()), Arc::new(AutoConfirm(true)))
    }

    pub fn with_confirmation(confirmation: Arc<dyn Confirmation>) -> Self {
        Self::with_parts(Arc::new(MemoryObjectStore::new()), confirmation)
    }

    pub fn with_store(store: Arc<MemoryObjectStore>) -> Self {
        Self::with_parts(store, Arc::new(AutoConfirm(true)))
    }

    fn with_parts(store: Arc<MemoryObjectStore>, confirmation: Arc<dyn Confirmation>) -> Self {
        let backend = Arc::new(FakeBackend::new(store.clone()));
        let uploader = Arc::new(GatedUploader::new(store.clone()));
        let registry = Arc::new(DriverRegistry::new(backend.clone()));
        let coordinator = DocumentUploadCoordinator::new(backend.clone(), uploader.clone());
        let (publisher, feedback) = FeedbackPublisher::channel();

        let controller = DriverWorkflowController::new(
            registry,
            coordinator,
            ValidationGate::default(),
            confirmation,
            publisher,
        );

        Self {
            controller,
            backend,
            store,
            uploader,
            feedback,
        }
    }

    /// Drain every event published so far.
    pub fn events(&mut self) -> Vec<FeedbackEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.feedback.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn pdf(name: &str, size: usize) -> DocumentFile {
    DocumentFile::new(name, "application/pdf", vec![b'%'; size])
}

pub fn png(name: &str, size: usize) -> DocumentFile {
    DocumentFile::new(name, "image/png", vec![0u8; size])
}

pub fn create_dto(license_number: &str) -> CreateDriverDto {
    CreateDriverDto {
        first_name: "Ada".to_string(),
        last_name: "Okafor".to_string(),
        email: "ada@example.com".to_string(),
        phone: "+2348012345678".to_string(),
        license_number: license_number.to_string(),
        license_class: Some("B".to_string()),
        license_expiry: NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
        status: None,
    }
}
