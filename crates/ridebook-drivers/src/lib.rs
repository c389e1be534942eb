//! Ridebook driver workflow
//!
//! Ties the driver pipeline together:
//! - [`DocumentUploadCoordinator`]: ticket issuance followed by the direct storage write
//! - [`DriverRegistry`]: CRUD over drivers and the caller's local list view
//! - [`DriverWorkflowController`]: per-row and per-field state machines, feedback
//!   and delete confirmation
//!
//! Nothing in this crate retries on its own. Every failure is reported to the
//! caller and to the feedback channel; recovery is user-initiated.

pub mod confirm;
pub mod coordinator;
pub mod feedback;
pub mod registry;
pub mod state;
pub mod workflow;

pub use confirm::{AutoConfirm, Confirmation};
pub use coordinator::DocumentUploadCoordinator;
pub use feedback::{FeedbackEvent, FeedbackKind, FeedbackPublisher, FeedbackReceiver};
pub use registry::DriverRegistry;
pub use state::{FieldState, RowKey, RowState, StateError};
pub use workflow::{DriverWorkflowController, UploadOutcome};
