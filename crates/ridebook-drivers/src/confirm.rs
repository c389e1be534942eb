use async_trait::async_trait;
use uuid::Uuid;

/// Asks the user before a destructive action. Presentation is up to the implementor.
#[async_trait]
pub trait Confirmation: Send + Sync {
    /// `label` is a human readable name for the driver (full name, or the id
    /// when the driver is not in the local view).
    async fn confirm_delete(&self, driver_id: Uuid, label: &str) -> bool;
}

/// Fixed answer, for pre-approved deletes (`--yes`) and tests.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirmation for AutoConfirm {
    async fn confirm_delete(&self, driver_id: Uuid, label: &str) -> bool {
        tracing::debug!(driver_id = %driver_id, label, answer = self.0, "Delete confirmation answered automatically");
        self.0
    }
}
