//! Board state and the operations that change it.

pub mod mutator;
pub mod order;
pub mod reconcile;
pub mod store;

pub use mutator::Mutator;
pub use order::{PositionPatch, ReorderError, reorder};
pub use reconcile::Reconciler;
pub use store::{StoreChange, TaskStore};

use syncboard_proto::task::{TaskId, ValidationError};

use crate::sync::SyncError;

/// Errors surfaced by user-initiated board mutations.
#[derive(Debug, thiserror::Error)]
pub enum MutateError {
    /// Input failed local validation; nothing was sent or stored.
    #[error("validation failed: {0}")]
    Invalid(#[from] ValidationError),
    /// A task with the same title already exists in the local view. This
    /// is a best-effort guard; the service does not enforce uniqueness.
    #[error("a task titled {0:?} already exists")]
    DuplicateTitle(String),
    /// The referenced task is not in the store.
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// An add is already in flight; this submission was dropped.
    #[error("another add is already in flight")]
    AddInFlight,
    /// The persistence call failed.
    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),
}
