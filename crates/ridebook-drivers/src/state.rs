//! Row and document-field state machines
//!
//! Row: `Idle -> Editing -> Submitting -> {Idle | Editing(error)}`.
//!
//! Field: `NotSelected -> Validated -> RequestingTicket -> Uploading -> Committing -> Uploaded`,
//! with `Failed` reachable from every in-progress stage. `Failed` only moves forward
//! to `RequestingTicket`. A new selection restarts the machine at `Validated` from
//! any state and bumps the field generation; async results carrying an older
//! generation are ignored.

use ridebook_core::models::DocumentFile;
use ridebook_core::{AppError, ErrorKind, ErrorMetadata, FieldError};
use uuid::Uuid;

/// Identifies a row of the driver table. `New` is the create form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    New,
    Existing(Uuid),
}

/// Error as kept on a state machine: the presentable part of an `AppError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateError {
    pub kind: ErrorKind,
    pub message: String,
    pub fields: Vec<FieldError>,
}

impl From<&AppError> for StateError {
    fn from(err: &AppError) -> Self {
        Self {
            kind: err.kind(),
            message: err.client_message(),
            fields: err.field_errors().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RowState {
    #[default]
    Idle,
    Editing {
        error: Option<StateError>,
    },
    Submitting,
}

impl RowState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, RowState::Submitting)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldState {
    #[default]
    NotSelected,
    Validated,
    RequestingTicket,
    Uploading,
    Committing,
    Uploaded {
        storage_key: String,
    },
    Failed(StateError),
}

impl FieldState {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            FieldState::RequestingTicket | FieldState::Uploading | FieldState::Committing
        )
    }

    /// Forward transitions of one attempt. New selections are not listed here;
    /// they are always allowed and handled by [`FieldMachine::select`].
    pub fn can_transition_to(&self, next: &FieldState) -> bool {
        use FieldState::*;
        matches!(
            (self, next),
            (Validated, RequestingTicket)
                | (RequestingTicket, Uploading)
                | (Uploading, Committing)
                | (Committing, Uploaded { .. })
                | (Validated | RequestingTicket | Uploading | Committing, Failed(_))
                | (Failed(_), RequestingTicket)
        )
    }
}

/// Per-field machine with its generation counter and the last validated file.
#[derive(Debug, Clone, Default)]
pub(crate) struct FieldMachine {
    state: FieldState,
    generation: u64,
    file: Option<DocumentFile>,
}

impl FieldMachine {
    pub fn state(&self) -> &FieldState {
        &self.state
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Accept a validated file. Any in-flight attempt becomes stale.
    pub fn select(&mut self, file: DocumentFile) -> u64 {
        self.generation += 1;
        self.state = FieldState::Validated;
        self.file = Some(file);
        self.generation
    }

    /// Apply `next` for the attempt owning `generation`.
    ///
    /// Returns false, leaving the machine untouched, when the attempt is stale
    /// or the transition is not allowed.
    pub fn advance(&mut self, generation: u64, next: FieldState) -> bool {
        if !self.is_current(generation) || !self.state.can_transition_to(&next) {
            return false;
        }
        self.state = next;
        true
    }

    /// Restart a failed field at `RequestingTicket` with the last validated file.
    pub fn restart(&mut self) -> Result<(u64, DocumentFile), AppError> {
        if !matches!(self.state, FieldState::Failed(_)) {
            return Err(if self.state.is_in_flight() {
                AppError::Busy("An upload is already in progress for this document".to_string())
            } else {
                AppError::Validation {
                    message: "There is no failed upload to retry for this document".to_string(),
                    fields: Vec::new(),
                }
            });
        }
        let Some(file) = self.file.clone() else {
            return Err(AppError::Internal(
                "Failed upload has no file to retry with".to_string(),
            ));
        };

        self.generation += 1;
        self.state = FieldState::RequestingTicket;
        Ok((self.generation, file))
    }

    /// Drop the field back to `NotSelected`; in-flight results will be ignored.
    pub fn abandon(&mut self) {
        self.generation += 1;
        self.state = FieldState::NotSelected;
        self.file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> DocumentFile {
        DocumentFile::new(name, "application/pdf", b"%PDF".to_vec())
    }

    fn failure() -> FieldState {
        FieldState::Failed(StateError::from(&AppError::Network("reset".to_string())))
    }

    #[test]
    fn happy_path_walks_every_stage() {
        let mut machine = FieldMachine::default();
        let generation = machine.select(pdf("a.pdf"));

        assert!(machine.advance(generation, FieldState::RequestingTicket));
        assert!(machine.advance(generation, FieldState::Uploading));
        assert!(machine.advance(generation, FieldState::Committing));
        assert!(machine.advance(
            generation,
            FieldState::Uploaded {
                storage_key: "k".to_string()
            }
        ));
        assert_eq!(
            machine.state(),
            &FieldState::Uploaded {
                storage_key: "k".to_string()
            }
        );
    }

    #[test]
    fn stages_cannot_be_skipped() {
        let mut machine = FieldMachine::default();
        let generation = machine.select(pdf("a.pdf"));

        assert!(!machine.advance(generation, FieldState::Uploading));
        assert!(!machine.advance(generation, FieldState::Committing));
        assert_eq!(machine.state(), &FieldState::Validated);
    }

    #[test]
    fn new_selection_makes_old_generation_stale() {
        let mut machine = FieldMachine::default();
        let first = machine.select(pdf("a.pdf"));
        assert!(machine.advance(first, FieldState::RequestingTicket));
        assert!(machine.advance(first, FieldState::Uploading));

        let second = machine.select(pdf("b.pdf"));

        assert!(!machine.advance(first, FieldState::Committing));
        assert!(!machine.advance(first, failure()));
        assert_eq!(machine.state(), &FieldState::Validated);
        assert!(machine.advance(second, FieldState::RequestingTicket));
    }

    #[test]
    fn failed_only_moves_to_requesting_ticket() {
        assert!(failure().can_transition_to(&FieldState::RequestingTicket));
        assert!(!failure().can_transition_to(&FieldState::Uploading));
        assert!(!failure().can_transition_to(&FieldState::Validated));
        assert!(!FieldState::NotSelected.can_transition_to(&failure()));
        assert!(!FieldState::Uploaded {
            storage_key: "k".to_string()
        }
        .can_transition_to(&failure()));
    }

    #[test]
    fn restart_reuses_last_validated_file() {
        let mut machine = FieldMachine::default();
        let first = machine.select(pdf("license.pdf"));
        assert!(machine.advance(first, failure()));

        let (second, file) = machine.restart().unwrap();

        assert!(second > first);
        assert_eq!(file.file_name, "license.pdf");
        assert_eq!(machine.state(), &FieldState::RequestingTicket);
    }

    #[test]
    fn restart_is_refused_outside_failed() {
        let mut machine = FieldMachine::default();
        assert_eq!(machine.restart().unwrap_err().kind(), ErrorKind::Validation);

        let generation = machine.select(pdf("a.pdf"));
        assert!(machine.advance(generation, FieldState::RequestingTicket));
        assert_eq!(machine.restart().unwrap_err().kind(), ErrorKind::Busy);
    }

    #[test]
    fn abandon_invalidates_in_flight_attempt() {
        let mut machine = FieldMachine::default();
        let generation = machine.select(pdf("a.pdf"));
        assert!(machine.advance(generation, FieldState::RequestingTicket));

        machine.abandon();

        assert!(!machine.advance(generation, FieldState::Uploading));
        assert_eq!(machine.state(), &FieldState::NotSelected);
    }
}
