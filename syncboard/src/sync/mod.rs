//! Synchronization channel: the engine's one gateway to the service.
//!
//! A channel pairs a request/response persistence API with a
//! fire-and-forget real-time event link. Both halves sit behind traits so
//! sessions run identically against the production HTTP/WebSocket pair or
//! the in-memory doubles in [`memory`].

pub mod api;
pub mod link;
pub mod memory;

use std::time::Duration;

use syncboard_proto::api::{NewTask, NewUser, TaskUpdate};
use syncboard_proto::event::BoardEvent;
use syncboard_proto::task::{OwnerId, Task, TaskId};

pub use api::{HttpApi, SyncApi};
pub use link::{EventLink, WsLink};
pub use memory::{InMemoryApi, MemoryHub, MemoryLink};

/// Errors surfaced by the synchronization channel.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Transport failure, or a non-success status from the service.
    #[error("network error: {0}")]
    Network(String),
    /// The service rejected the payload as invalid.
    #[error("request rejected: {0}")]
    Rejected(String),
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,
    /// The real-time link is closed; no further events will arrive.
    #[error("event link closed")]
    LinkClosed,
}

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_EVENT_BUFFER: usize = 256;

/// Configuration for the production channel.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the persistence API, e.g. `http://127.0.0.1:4000`.
    pub api_url: String,
    /// WebSocket URL of the event hub, e.g. `ws://127.0.0.1:4000/ws`.
    pub hub_url: String,
    /// Timeout applied to each API request.
    pub request_timeout: Duration,
    /// Timeout for establishing the WebSocket connection.
    pub connect_timeout: Duration,
    /// Capacity of the inbound event buffer.
    pub event_buffer: usize,
}

impl SyncConfig {
    /// Creates a configuration for the given service URLs with default
    /// timeouts and buffer size.
    #[must_use]
    pub const fn new(api_url: String, hub_url: String) -> Self {
        Self {
            api_url,
            hub_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// A persistence API and an event link, bound together for one session.
///
/// Sessions receive the channel fully constructed and never build their
/// own, so tests can hand in [`InMemoryApi`] and [`MemoryLink`] where
/// production wires up [`HttpApi`] and [`WsLink`].
#[derive(Debug)]
pub struct SyncChannel<A, L> {
    api: A,
    link: L,
}

impl SyncChannel<HttpApi, WsLink> {
    /// Connects the production channel: an HTTP client for persistence
    /// and a WebSocket to the event hub.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Network`] if either endpoint cannot be
    /// reached, or [`SyncError::Timeout`] if the WebSocket handshake
    /// exceeds `config.connect_timeout`.
    pub async fn connect(config: &SyncConfig) -> Result<Self, SyncError> {
        let api = HttpApi::new(&config.api_url, config.request_timeout)?;
        let link = WsLink::connect(config).await?;
        Ok(Self::new(api, link))
    }
}

impl<A: SyncApi, L: EventLink> SyncChannel<A, L> {
    /// Binds an API client and an event link into one channel.
    pub const fn new(api: A, link: L) -> Self {
        Self { api, link }
    }

    // --- request/response half ---

    /// Registers the authenticated user's profile with the service.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the request fails or is rejected.
    pub async fn register_user(&self, user: &NewUser) -> Result<(), SyncError> {
        self.api.register_user(user).await
    }

    /// Fetches every task belonging to `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the request fails.
    pub async fn list_tasks(&self, owner: &OwnerId) -> Result<Vec<Task>, SyncError> {
        self.api.list_tasks(owner).await
    }

    /// Persists a new task. The service assigns the id and creation time
    /// and returns the canonical record.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the request fails or is rejected.
    pub async fn create_task(&self, new: &NewTask) -> Result<Task, SyncError> {
        self.api.create_task(new).await
    }

    /// Replaces the stored fields of the task with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the request fails or is rejected.
    pub async fn update_task(&self, id: &TaskId, update: &TaskUpdate) -> Result<Task, SyncError> {
        self.api.update_task(id, update).await
    }

    /// Deletes the task with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the request fails.
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), SyncError> {
        self.api.delete_task(id).await
    }

    // --- real-time half ---

    /// Queues `event` for broadcast to all other connected clients.
    /// Fire-and-forget: failures are logged, never returned.
    pub fn broadcast(&self, event: &BoardEvent) {
        self.link.publish(event);
    }

    /// Awaits the next inbound peer event, in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::LinkClosed`] once the link is down.
    pub async fn next_event(&self) -> Result<BoardEvent, SyncError> {
        self.link.next_event().await
    }

    /// Whether the real-time link is currently open.
    pub fn is_open(&self) -> bool {
        self.link.is_open()
    }

    /// Tears the real-time link down. Pending and future
    /// [`next_event`](Self::next_event) calls return
    /// [`SyncError::LinkClosed`].
    pub fn close(&self) {
        self.link.close();
    }
}
