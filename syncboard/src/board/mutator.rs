//! User-intent mutations: validate, apply, persist, broadcast.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use syncboard_proto::api::{NewTask, TaskUpdate};
use syncboard_proto::event::BoardEvent;
use syncboard_proto::task::{Category, OwnerId, Task, TaskDraft, TaskId};

use crate::sync::{EventLink, SyncApi, SyncChannel};

use super::MutateError;
use super::order::{ReorderError, reorder};
use super::reconcile::Reconciler;
use super::store::TaskStore;

/// Orchestrates user-initiated board changes.
///
/// Every operation follows the same template: validate, persist through
/// the channel, then update the store and broadcast on success. Moves are
/// the one exception that touches the store before the service confirms;
/// a failed move is repaired by asking the reconciler for a full resync
/// instead of unwinding the patch by hand.
#[derive(Debug)]
pub struct Mutator<A, L> {
    owner: OwnerId,
    store: Arc<TaskStore>,
    channel: Arc<SyncChannel<A, L>>,
    policy: Arc<Reconciler<A, L>>,
    add_in_flight: AtomicBool,
}

impl<A: SyncApi, L: EventLink> Mutator<A, L> {
    /// Creates a mutator for one owner's session.
    pub fn new(
        owner: OwnerId,
        store: Arc<TaskStore>,
        channel: Arc<SyncChannel<A, L>>,
        policy: Arc<Reconciler<A, L>>,
    ) -> Self {
        Self {
            owner,
            store,
            channel,
            policy,
            add_in_flight: AtomicBool::new(false),
        }
    }

    /// Creates a task from `draft` at the end of the To-Do column.
    ///
    /// Nothing enters the store until the service confirms and returns the
    /// canonical task with its id; a failed create leaves no trace. While
    /// one add is in flight, further submissions are dropped rather than
    /// queued.
    ///
    /// # Errors
    ///
    /// Returns [`MutateError::AddInFlight`] while an earlier add is still
    /// awaiting the service, [`MutateError::Invalid`] or
    /// [`MutateError::DuplicateTitle`] when the draft fails the local
    /// checks, and [`MutateError::Sync`] when persistence fails.
    pub async fn add_task(&self, draft: &TaskDraft) -> Result<Task, MutateError> {
        if self.add_in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("add dropped, another add is in flight");
            return Err(MutateError::AddInFlight);
        }
        let result = self.add_task_inner(draft).await;
        self.add_in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn add_task_inner(&self, draft: &TaskDraft) -> Result<Task, MutateError> {
        let draft = draft.normalize()?;
        if self.store.has_title(&draft.title) {
            tracing::debug!(title = %draft.title, "duplicate title in local view");
            return Err(MutateError::DuplicateTitle(draft.title));
        }
        let new = NewTask {
            title: draft.title,
            description: draft.description,
            owner: self.owner.clone(),
            category: Category::Todo,
            position: self.store.count_in(Category::Todo),
        };
        let task = self.channel.create_task(&new).await?;
        tracing::info!(task = %task.id, "task created");
        self.store.upsert(task.clone());
        self.channel.broadcast(&BoardEvent::TaskCreated(task.clone()));
        Ok(task)
    }

    /// Deletes a task. The caller is responsible for having confirmed the
    /// intent; this method goes straight to the service.
    ///
    /// The store changes only after the service acknowledges.
    ///
    /// # Errors
    ///
    /// Returns [`MutateError::NotFound`] for an id no longer in the store
    /// (a no-op), or [`MutateError::Sync`] when persistence fails, in
    /// which case the task stays.
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), MutateError> {
        if !self.store.contains(id) {
            tracing::warn!(task = %id, "delete for unknown task ignored");
            return Err(MutateError::NotFound(id.clone()));
        }
        self.channel.delete_task(id).await?;
        tracing::info!(task = %id, "task deleted");
        self.store.remove(id);
        self.channel.broadcast(&BoardEvent::TaskDeleted(id.clone()));
        Ok(())
    }

    /// Replaces a task's title and description.
    ///
    /// Not optimistic: the store keeps its pre-edit state until the
    /// service returns the canonical task, so a failure needs no rollback.
    ///
    /// # Errors
    ///
    /// Returns [`MutateError::Invalid`] when the fields fail validation,
    /// [`MutateError::NotFound`] for an id no longer in the store, or
    /// [`MutateError::Sync`] when persistence fails.
    pub async fn edit_task(&self, id: &TaskId, fields: &TaskDraft) -> Result<Task, MutateError> {
        let fields = fields.normalize()?;
        let Some(current) = self.store.get(id) else {
            tracing::warn!(task = %id, "edit for unknown task ignored");
            return Err(MutateError::NotFound(id.clone()));
        };
        let mut update = TaskUpdate::from_task(&current);
        update.title = fields.title;
        update.description = fields.description;

        let task = self.channel.update_task(id, &update).await?;
        tracing::info!(task = %id, "task edited");
        if self.store.contains(id) {
            self.store.upsert(task.clone());
            self.channel.broadcast(&BoardEvent::TaskUpdated(task.clone()));
        } else {
            // A peer deleted the task while the edit was in flight; the
            // delete stays in effect.
            tracing::debug!(task = %id, "task deleted during edit, response dropped");
        }
        Ok(task)
    }

    /// Moves a task to a new column slot, optimistically.
    ///
    /// The reorder patch lands in the store before the service is asked,
    /// so drags feel instantaneous. When the persist fails, the patch is
    /// discarded by refetching the owner's list wholesale; concurrent
    /// moves may have layered on top, so no attempt is made to unwind
    /// just this one.
    ///
    /// # Errors
    ///
    /// Returns [`MutateError::NotFound`] for an id no longer in the store
    /// (a no-op), or [`MutateError::Sync`] when persistence fails, after
    /// the resync has been attempted.
    pub async fn move_task(
        &self,
        id: &TaskId,
        source_category: Category,
        source_index: u32,
        dest_category: Category,
        dest_index: u32,
    ) -> Result<Task, MutateError> {
        let snapshot = self.store.list();
        let patches = match reorder(
            &snapshot,
            id,
            source_category,
            source_index,
            dest_category,
            dest_index,
        ) {
            Ok(patches) => patches,
            Err(ReorderError::TaskNotFound(missing)) => {
                tracing::warn!(task = %missing, "move for unknown task ignored");
                return Err(MutateError::NotFound(missing));
            }
        };
        if patches.is_empty() {
            // Dropped back onto its own slot; nothing to persist.
            return self.store.get(id).ok_or_else(|| MutateError::NotFound(id.clone()));
        }

        self.store.apply_moves(&patches);
        let Some(moved) = self.store.get(id) else {
            return Err(MutateError::NotFound(id.clone()));
        };

        let update = TaskUpdate::from_task(&moved);
        match self.channel.update_task(id, &update).await {
            Ok(canonical) => {
                tracing::info!(
                    task = %id,
                    category = %canonical.category,
                    position = canonical.position,
                    "task moved"
                );
                if self.store.contains(id) {
                    self.store.upsert(canonical.clone());
                    self.channel.broadcast(&BoardEvent::TaskUpdated(canonical.clone()));
                } else {
                    // A peer deleted the task mid-move; the delete wins.
                    tracing::debug!(task = %id, "task deleted during move, response dropped");
                }
                Ok(canonical)
            }
            Err(e) => {
                tracing::warn!(task = %id, err = %e, "move persist failed, resyncing from server");
                if let Err(resync_err) = self.policy.resync().await {
                    tracing::warn!(err = %resync_err, "rollback resync failed, store may be stale");
                }
                Err(e.into())
            }
        }
    }
}
