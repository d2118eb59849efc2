//! Business Services
//!
//! This module contains the editor persistence logic:
//!
//! - `Debouncer` - Trailing-edge debounce primitive owned by each coordinator
//! - `ContentRemovalGuard` - Deletes stored content that became blank
//! - `AutosaveSession` - Save state machine (skip / delete / write / retry)
//! - `AutosaveCoordinator` - Background task wiring edits, debounce and session
//! - `UploadPolicy` - Restrictions checked before the upload transport runs
//!
//! Services coordinate between the content store and the editor UI,
//! implementing the autosave rules on top of the store's upsert semantics.

pub mod autosave_coordinator;
pub mod autosave_session;
pub mod debounce;
pub mod error;
pub mod removal_guard;
pub mod upload_policy;

pub use autosave_coordinator::{AutosaveCoordinator, AutosaveHandle};
pub use autosave_session::{AutosaveSession, SettleOutcome};
pub use debounce::Debouncer;
pub use error::{AutosaveError, UploadError};
pub use removal_guard::ContentRemovalGuard;
pub use upload_policy::{
    bearer_header, object_name, UploadCandidate, UploadPlan, UploadPolicy, UploadTarget,
    SCREENSHOTS_FOLDER,
};
