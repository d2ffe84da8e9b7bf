//! Inbound reconciliation: peer broadcasts and authoritative resyncs.

use std::sync::Arc;

use syncboard_proto::event::BoardEvent;
use syncboard_proto::task::{OwnerId, Task};

use crate::sync::{EventLink, SyncApi, SyncChannel, SyncError};

use super::store::TaskStore;

/// Merges peer events and server truth into the store.
///
/// Peer events apply last-write-wins in arrival order; the one
/// authoritative tie-breaker is [`resync`](Reconciler::resync), which
/// replaces the collection with the server's list wholesale. Nothing here
/// broadcasts: reconciliation only ever consumes.
#[derive(Debug)]
pub struct Reconciler<A, L> {
    owner: OwnerId,
    store: Arc<TaskStore>,
    channel: Arc<SyncChannel<A, L>>,
}

impl<A: SyncApi, L: EventLink> Reconciler<A, L> {
    /// Creates a reconciler for one owner's session.
    pub const fn new(owner: OwnerId, store: Arc<TaskStore>, channel: Arc<SyncChannel<A, L>>) -> Self {
        Self {
            owner,
            store,
            channel,
        }
    }

    /// Applies one inbound peer event to the store.
    ///
    /// Creations for an id already present are dropped, which covers the
    /// initiator's own broadcast coming back. Updates land wholesale,
    /// inserting when the id is unknown. Deletes are a no-op when the id
    /// is already gone. Creations and updates for another owner's tasks
    /// are ignored; they belong to a board this store never renders.
    pub fn apply_event(&self, event: BoardEvent) {
        match event {
            BoardEvent::TaskCreated(task) => {
                if self.foreign(&task) {
                    return;
                }
                if self.store.contains(&task.id) {
                    tracing::debug!(task = %task.id, "created event for known id dropped");
                    return;
                }
                tracing::debug!(task = %task.id, "peer created task");
                self.store.upsert(task);
            }
            BoardEvent::TaskUpdated(task) => {
                if self.foreign(&task) {
                    return;
                }
                tracing::debug!(task = %task.id, "peer updated task");
                self.store.upsert(task);
            }
            BoardEvent::TaskDeleted(id) => {
                if self.store.remove(&id) {
                    tracing::debug!(task = %id, "peer deleted task");
                } else {
                    tracing::debug!(task = %id, "delete event for unknown id, nothing to do");
                }
            }
        }
    }

    /// Replaces the store with the server's list for this owner, sorted by
    /// `(category, position)`.
    ///
    /// # Errors
    ///
    /// Returns the fetch error unchanged; the store keeps its current
    /// contents when the fetch fails.
    pub async fn resync(&self) -> Result<(), SyncError> {
        let mut tasks = self.channel.list_tasks(&self.owner).await?;
        tasks.sort_unstable_by_key(|task| (task.category, task.position));
        let count = tasks.len();
        self.store.replace_all(tasks);
        tracing::info!(count, "store resynced from server");
        Ok(())
    }

    fn foreign(&self, task: &Task) -> bool {
        if task.owner == self.owner {
            return false;
        }
        tracing::debug!(task = %task.id, owner = %task.owner, "event for another owner ignored");
        true
    }
}
