//! In-memory task store, the single local source of truth for one board.
//!
//! `TaskStore` holds the authenticated owner's tasks and emits a
//! [`StoreChange`] for every mutation so a render layer can redraw without
//! polling. Mutations never touch the network; the mutator and reconciler
//! decide what goes in.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use syncboard_proto::task::{Category, Task, TaskId};

use super::order::PositionPatch;

/// Notification emitted after each store mutation.
#[derive(Debug, Clone)]
pub enum StoreChange {
    /// A task was inserted, or an existing id was overwritten wholesale.
    Upserted(Task),
    /// A task left the store.
    Removed(TaskId),
    /// A reorder patch landed; carries the placements that changed.
    Reordered(Vec<PositionPatch>),
    /// The whole collection was replaced from server truth.
    Replaced,
}

/// In-memory ordered collection of tasks.
///
/// Each mutation sends exactly one [`StoreChange`] while the collection
/// lock is held, so subscribers observe notifications in mutation order
/// and never see a half-applied patch.
#[derive(Debug)]
pub struct TaskStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
    changes: mpsc::UnboundedSender<StoreChange>,
}

impl TaskStore {
    /// Creates an empty store and the receiving end of its change feed.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StoreChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Self {
            tasks: Mutex::new(HashMap::new()),
            changes: tx,
        };
        (store, rx)
    }

    /// Returns all tasks in board order: grouped by category, ascending
    /// position within each.
    #[must_use]
    pub fn list(&self) -> Vec<Task> {
        let tasks = self.tasks.lock();
        let mut out: Vec<Task> = tasks.values().cloned().collect();
        drop(tasks);
        out.sort_unstable_by_key(|task| (task.category, task.position));
        out
    }

    /// Returns the task with the given id, if present.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.lock().get(id).cloned()
    }

    /// Whether the store holds a task with the given id.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.lock().contains_key(id)
    }

    /// Number of tasks currently in `category`.
    #[must_use]
    pub fn count_in(&self, category: Category) -> u32 {
        let count = self
            .tasks
            .lock()
            .values()
            .filter(|task| task.category == category)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Whether any stored task carries exactly this title.
    #[must_use]
    pub fn has_title(&self, title: &str) -> bool {
        self.tasks.lock().values().any(|task| task.title == title)
    }

    /// Total number of stored tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Inserts the task, replacing any stored task with the same id.
    pub fn upsert(&self, task: Task) {
        let mut tasks = self.tasks.lock();
        tasks.insert(task.id.clone(), task.clone());
        let _ = self.changes.send(StoreChange::Upserted(task));
    }

    /// Removes the task with the given id. Returns whether it was present;
    /// removing an absent id emits nothing.
    pub fn remove(&self, id: &TaskId) -> bool {
        let mut tasks = self.tasks.lock();
        if tasks.remove(id).is_none() {
            return false;
        }
        let _ = self.changes.send(StoreChange::Removed(id.clone()));
        true
    }

    /// Replaces the whole collection with `new_tasks`.
    pub fn replace_all(&self, new_tasks: Vec<Task>) {
        let mut tasks = self.tasks.lock();
        tasks.clear();
        for task in new_tasks {
            tasks.insert(task.id.clone(), task);
        }
        let _ = self.changes.send(StoreChange::Replaced);
    }

    /// Applies a reorder patch set as one atomic mutation.
    ///
    /// Patch entries whose task has left the store in the meantime are
    /// skipped; the remaining entries still land together under one lock
    /// and one notification.
    pub fn apply_moves(&self, patches: &[PositionPatch]) {
        if patches.is_empty() {
            return;
        }
        let mut tasks = self.tasks.lock();
        let mut applied = Vec::with_capacity(patches.len());
        for patch in patches {
            if let Some(task) = tasks.get_mut(&patch.id) {
                task.category = patch.category;
                task.position = patch.position;
                applied.push(patch.clone());
            }
        }
        if !applied.is_empty() {
            let _ = self.changes.send(StoreChange::Reordered(applied));
        }
    }
}
