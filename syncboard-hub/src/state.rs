//! Hub server state: the task map, user registry, and connected-client
//! fan-out table.
//!
//! Tasks are stored wholesale, exactly as clients send them. The hub
//! never renumbers positions or resolves conflicts; clients compute
//! placement themselves and the hub serves stored truth back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use tokio::sync::{RwLock, mpsc};

use syncboard_proto::api::{NewTask, NewUser, TaskUpdate};
use syncboard_proto::task::{OwnerId, Task, TaskId, Timestamp};

/// Shared hub state holding board truth and the event-client registry.
pub struct BoardState {
    /// Every stored task, keyed by id.
    tasks: RwLock<HashMap<TaskId, Task>>,
    /// Registered user profiles, newest registration wins per uid.
    users: RwLock<Vec<NewUser>>,
    /// Maps connection id to a channel sender feeding that client's
    /// WebSocket writer.
    clients: RwLock<HashMap<u64, mpsc::UnboundedSender<Message>>>,
    /// Source of connection ids.
    next_client_id: AtomicU64,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    /// Creates a new hub state with no tasks, users, or clients.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            users: RwLock::new(Vec::new()),
            clients: RwLock::new(HashMap::new()),
            next_client_id: AtomicU64::new(0),
        }
    }

    // --- users ---

    /// Stores a user profile, replacing any earlier registration with the
    /// same uid. Re-login re-registers; that must not accumulate rows.
    pub async fn register_user(&self, user: NewUser) {
        let mut users = self.users.write().await;
        if let Some(existing) = users.iter_mut().find(|u| u.uid == user.uid) {
            *existing = user;
        } else {
            users.push(user);
        }
    }

    /// Number of registered user profiles.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    // --- tasks ---

    /// Returns `owner`'s tasks grouped by category and ordered by position
    /// within each, the order boards render in.
    pub async fn list_tasks(&self, owner: &OwnerId) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let mut out: Vec<Task> = tasks
            .values()
            .filter(|task| task.owner == *owner)
            .cloned()
            .collect();
        out.sort_unstable_by_key(|task| (task.category, task.position));
        out
    }

    /// Stores a new task, assigning its id and creation time, and returns
    /// the canonical record.
    pub async fn insert_task(&self, new: NewTask) -> Task {
        let task = Task {
            id: TaskId::new(),
            owner: new.owner,
            title: new.title,
            description: new.description,
            category: new.category,
            position: new.position,
            created_at: Timestamp::now(),
        };
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id.clone(), task.clone());
        task
    }

    /// Replaces the stored fields of the task with the given id, returning
    /// the new record, or `None` if no such task exists.
    pub async fn replace_task(&self, id: &TaskId, update: TaskUpdate) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let stored_owner = tasks.get(id)?.owner.clone();
        let mut task = update.into_task(id.clone());
        // Owner is immutable; whatever the payload says, keep the stored one.
        task.owner = stored_owner;
        tasks.insert(id.clone(), task.clone());
        Some(task)
    }

    /// Removes the task with the given id. Returns whether it existed.
    pub async fn remove_task(&self, id: &TaskId) -> bool {
        let mut tasks = self.tasks.write().await;
        tasks.remove(id).is_some()
    }

    // --- event clients ---

    /// Registers a connected client, returning its connection id.
    pub async fn attach_client(&self, sender: mpsc::UnboundedSender<Message>) -> u64 {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let mut clients = self.clients.write().await;
        clients.insert(id, sender);
        id
    }

    /// Removes a client from the registry, returning its sender if it was
    /// still attached.
    pub async fn detach_client(&self, id: u64) -> Option<mpsc::UnboundedSender<Message>> {
        let mut clients = self.clients.write().await;
        clients.remove(&id)
    }

    /// Number of attached event clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Forwards `message` to every attached client except `from`. Clients
    /// whose channel is gone are detached.
    pub async fn fan_out(&self, from: u64, message: &Message) {
        let targets: Vec<(u64, mpsc::UnboundedSender<Message>)> = {
            let clients = self.clients.read().await;
            clients
                .iter()
                .filter(|(id, _)| **id != from)
                .map(|(id, sender)| (*id, sender.clone()))
                .collect()
        };

        let mut dead = Vec::new();
        for (id, sender) in targets {
            if sender.send(message.clone()).is_err() {
                dead.push(id);
            }
        }
        for id in dead {
            tracing::debug!(client = id, "dropping dead event client");
            self.detach_client(id).await;
        }
    }
}
