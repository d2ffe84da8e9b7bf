//! In-memory channel doubles for deterministic tests.
//!
//! [`InMemoryApi`] persists to a shared map and can be told to fail every
//! request; [`MemoryHub`] wires any number of [`MemoryLink`]s together so a
//! publish on one arrives on all the others. Together they let whole
//! sessions run with no sockets involved.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc};

use syncboard_proto::api::{NewTask, NewUser, TaskUpdate};
use syncboard_proto::event::BoardEvent;
use syncboard_proto::task::{OwnerId, Task, TaskId, Timestamp};

use super::SyncError;
use super::api::SyncApi;
use super::link::EventLink;

/// Shared in-memory persistence backend.
///
/// Clones share one backing map, so several sessions in a test can talk
/// to the same "server".
#[derive(Debug, Clone, Default)]
pub struct InMemoryApi {
    inner: Arc<ApiInner>,
}

#[derive(Debug, Default)]
struct ApiInner {
    tasks: Mutex<HashMap<TaskId, Task>>,
    users: Mutex<Vec<NewUser>>,
    failing: AtomicBool,
    failing_writes: AtomicBool,
}

impl InMemoryApi {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When `failing` is set, every subsequent request returns
    /// [`SyncError::Network`] without touching the map.
    pub fn fail_requests(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::Relaxed);
    }

    /// When `failing` is set, create/update/delete fail while reads keep
    /// working. Models a service that rejects writes but still serves its
    /// stored truth, which is what a rollback refetch needs.
    pub fn fail_writes(&self, failing: bool) {
        self.inner.failing_writes.store(failing, Ordering::Relaxed);
    }

    /// Server-side view of `owner`'s tasks, in the order the list call
    /// returns them.
    #[must_use]
    pub fn stored_tasks(&self, owner: &OwnerId) -> Vec<Task> {
        let tasks = self.inner.tasks.lock();
        let mut out: Vec<Task> = tasks
            .values()
            .filter(|task| task.owner == *owner)
            .cloned()
            .collect();
        drop(tasks);
        out.sort_unstable_by_key(|task| (task.category, task.position));
        out
    }

    /// Registered user profiles, in registration order.
    #[must_use]
    pub fn registered_users(&self) -> Vec<NewUser> {
        self.inner.users.lock().clone()
    }

    /// Puts a task into the backend directly, bypassing the API surface.
    pub fn seed(&self, task: Task) {
        self.inner.tasks.lock().insert(task.id.clone(), task);
    }

    fn gate(&self) -> Result<(), SyncError> {
        if self.inner.failing.load(Ordering::Relaxed) {
            return Err(SyncError::Network("injected failure".to_string()));
        }
        Ok(())
    }

    fn write_gate(&self) -> Result<(), SyncError> {
        self.gate()?;
        if self.inner.failing_writes.load(Ordering::Relaxed) {
            return Err(SyncError::Network("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl SyncApi for InMemoryApi {
    async fn register_user(&self, user: &NewUser) -> Result<(), SyncError> {
        self.gate()?;
        self.inner.users.lock().push(user.clone());
        Ok(())
    }

    async fn list_tasks(&self, owner: &OwnerId) -> Result<Vec<Task>, SyncError> {
        self.gate()?;
        Ok(self.stored_tasks(owner))
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task, SyncError> {
        self.write_gate()?;
        new.validate().map_err(|e| SyncError::Rejected(e.to_string()))?;
        let task = Task {
            id: TaskId::new(),
            owner: new.owner.clone(),
            title: new.title.clone(),
            description: new.description.clone(),
            category: new.category,
            position: new.position,
            created_at: Timestamp::now(),
        };
        self.inner.tasks.lock().insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &TaskId, update: &TaskUpdate) -> Result<Task, SyncError> {
        self.write_gate()?;
        update
            .validate()
            .map_err(|e| SyncError::Rejected(e.to_string()))?;
        let mut tasks = self.inner.tasks.lock();
        if !tasks.contains_key(id) {
            return Err(SyncError::Network(format!("404: task {id} not found")));
        }
        let task = update.clone().into_task(id.clone());
        tasks.insert(id.clone(), task.clone());
        Ok(task)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), SyncError> {
        self.write_gate()?;
        if self.inner.tasks.lock().remove(id).is_none() {
            return Err(SyncError::Network(format!("404: task {id} not found")));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Peer {
    id: u64,
    tx: mpsc::UnboundedSender<BoardEvent>,
}

/// In-process event hub connecting any number of [`MemoryLink`]s.
#[derive(Debug, Clone, Default)]
pub struct MemoryHub {
    peers: Arc<Mutex<Vec<Peer>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryHub {
    /// Creates a hub with no links attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a new link. Events published on it reach every other
    /// currently attached link, in publish order; the publisher never
    /// hears its own event back.
    #[must_use]
    pub fn attach(&self) -> MemoryLink {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.peers.lock().push(Peer { id, tx });
        MemoryLink {
            hub: self.clone(),
            id,
            inbound: AsyncMutex::new(rx),
            open: AtomicBool::new(true),
        }
    }

    fn fan_out(&self, from: u64, event: &BoardEvent) {
        let mut peers = self.peers.lock();
        peers.retain(|peer| !peer.tx.is_closed());
        for peer in peers.iter() {
            if peer.id != from {
                let _ = peer.tx.send(event.clone());
            }
        }
    }

    fn detach(&self, id: u64) {
        self.peers.lock().retain(|peer| peer.id != id);
    }
}

/// One endpoint attached to a [`MemoryHub`].
#[derive(Debug)]
pub struct MemoryLink {
    hub: MemoryHub,
    id: u64,
    inbound: AsyncMutex<mpsc::UnboundedReceiver<BoardEvent>>,
    open: AtomicBool,
}

impl EventLink for MemoryLink {
    fn publish(&self, event: &BoardEvent) {
        if self.open.load(Ordering::Relaxed) {
            self.hub.fan_out(self.id, event);
        }
    }

    async fn next_event(&self) -> Result<BoardEvent, SyncError> {
        let mut inbound = self.inbound.lock().await;
        inbound.recv().await.ok_or(SyncError::LinkClosed)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::Relaxed) {
            self.hub.detach(self.id);
        }
    }
}
