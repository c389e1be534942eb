use ridebook_api_client::DriverBackend;
use ridebook_core::models::{CreateDriverDto, Driver, DriverFilter, UpdateDriverDto};
use ridebook_core::AppError;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Driver CRUD plus the caller's local view of the list.
///
/// The backend is the source of truth. The local view is only touched after a
/// call succeeds, and nothing orders racing responses: whichever resolves last
/// is what the view shows.
pub struct DriverRegistry {
    backend: Arc<dyn DriverBackend>,
    drivers: RwLock<Vec<Driver>>,
}

impl DriverRegistry {
    pub fn new(backend: Arc<dyn DriverBackend>) -> Self {
        Self {
            backend,
            drivers: RwLock::new(Vec::new()),
        }
    }

    fn view(&self) -> RwLockReadGuard<'_, Vec<Driver>> {
        self.drivers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn view_mut(&self) -> RwLockWriteGuard<'_, Vec<Driver>> {
        self.drivers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the list and replace the local view. Sorted by `(created_at, id)`.
    #[tracing::instrument(skip(self))]
    pub async fn get_drivers(&self, filter: &DriverFilter) -> Result<Vec<Driver>, AppError> {
        let mut drivers = self.backend.list_drivers(filter).await?;
        drivers.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        *self.view_mut() = drivers.clone();
        tracing::debug!(count = drivers.len(), "Driver list refreshed");
        Ok(drivers)
    }

    #[tracing::instrument(skip(self, dto), fields(license_number = %dto.license_number))]
    pub async fn create_driver(&self, dto: &CreateDriverDto) -> Result<Driver, AppError> {
        let driver = self.backend.create_driver(dto).await?;
        self.view_mut().push(driver.clone());
        tracing::info!(driver_id = %driver.id, "Driver created");
        Ok(driver)
    }

    /// Partial update.
    #[tracing::instrument(skip(self, dto), fields(driver_id = %id))]
    pub async fn update_driver(&self, id: Uuid, dto: &UpdateDriverDto) -> Result<Driver, AppError> {
        let driver = self.backend.update_driver(id, dto).await?;
        self.apply(driver.clone());
        tracing::info!("Driver updated");
        Ok(driver)
    }

    /// Partial update whose response only reaches the local view when `accept`
    /// returns true. Used to commit document keys.
    ///
    /// The backend write happens either way; `Ok(None)` means it landed but
    /// was rejected locally.
    #[tracing::instrument(skip(self, dto, accept), fields(driver_id = %id))]
    pub async fn update_driver_if<F>(
        &self,
        id: Uuid,
        dto: &UpdateDriverDto,
        accept: F,
    ) -> Result<Option<Driver>, AppError>
    where
        F: FnOnce(&Driver) -> bool,
    {
        let driver = self.backend.update_driver(id, dto).await?;
        if !accept(&driver) {
            tracing::debug!("Update response rejected, local view left as is");
            return Ok(None);
        }
        self.apply(driver.clone());
        tracing::info!("Driver updated");
        Ok(Some(driver))
    }

    fn apply(&self, driver: Driver) {
        let mut view = self.view_mut();
        match view.iter_mut().find(|d| d.id == driver.id) {
            Some(existing) => *existing = driver,
            None => view.push(driver),
        }
    }

    /// Not idempotent: deleting an id twice yields `NotFound` the second time.
    /// Callers must have the user's confirmation first.
    #[tracing::instrument(skip(self), fields(driver_id = %id))]
    pub async fn delete_driver(&self, id: Uuid) -> Result<(), AppError> {
        self.backend.delete_driver(id).await?;
        self.view_mut().retain(|d| d.id != id);
        tracing::info!("Driver deleted");
        Ok(())
    }

    /// Snapshot of the local view.
    pub fn drivers(&self) -> Vec<Driver> {
        self.view().clone()
    }

    pub fn find(&self, id: Uuid) -> Option<Driver> {
        self.view().iter().find(|d| d.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.view().len()
    }

    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }
}
