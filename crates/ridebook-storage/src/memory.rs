//! In-memory object store
//!
//! Behaves like a signed-URL store: a write is accepted only if the ticket has
//! not expired (wall-clock check against an injectable clock) and has not been
//! used before. Used by tests and offline demos.

use crate::keys::generate_document_key;
use crate::traits::{DirectUploader, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ridebook_core::models::{DocumentFile, FileType, UploadTicket};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Time source used for expiry checks.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub stored_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    objects: HashMap<String, StoredObject>,
    consumed_urls: HashSet<String>,
    injected_failures: VecDeque<StorageError>,
}

pub struct MemoryObjectStore {
    state: Mutex<State>,
    clock: Clock,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            state: Mutex::new(State::default()),
            clock,
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint a ticket for this store, the way a backend would.
    pub fn issue_ticket(&self, driver_id: Uuid, file_type: FileType, ttl: Duration) -> UploadTicket {
        let storage_key = generate_document_key(driver_id, file_type);
        UploadTicket {
            driver_id,
            file_type,
            upload_url: format!("memory://{}/{}", storage_key, Uuid::new_v4()),
            storage_key,
            required_fields: BTreeMap::new(),
            expires_at: (self.clock)() + ttl,
        }
    }

    /// Make the next write fail with `err` regardless of the ticket.
    pub fn fail_next(&self, err: StorageError) {
        self.state().injected_failures.push_back(err);
    }

    pub fn get(&self, storage_key: &str) -> Option<StoredObject> {
        self.state().objects.get(storage_key).cloned()
    }

    pub fn contains(&self, storage_key: &str) -> bool {
        self.state().objects.contains_key(storage_key)
    }

    pub fn len(&self) -> usize {
        self.state().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DirectUploader for MemoryObjectStore {
    async fn upload(&self, ticket: &UploadTicket, file: &DocumentFile) -> StorageResult<String> {
        let now = (self.clock)();
        let mut state = self.state();

        if let Some(err) = state.injected_failures.pop_front() {
            return Err(err);
        }

        if ticket.is_expired_at(now) {
            tracing::debug!(
                storage_key = %ticket.storage_key,
                expires_at = %ticket.expires_at,
                "Rejected write with expired ticket"
            );
            return Err(StorageError::ExpiredTicket(format!(
                "Request has expired at {}",
                ticket.expires_at.to_rfc3339()
            )));
        }

        if !state.consumed_urls.insert(ticket.upload_url.clone()) {
            return Err(StorageError::TicketAlreadyUsed(ticket.storage_key.clone()));
        }

        state.objects.insert(
            ticket.storage_key.clone(),
            StoredObject {
                file_name: file.file_name.clone(),
                content_type: file.content_type.clone(),
                size: file.size(),
                stored_at: now,
            },
        );

        Ok(ticket.storage_key.clone())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
