//! Session lifecycle: registration, initial load, and the event pump.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use syncboard_proto::api::NewUser;
use syncboard_proto::task::OwnerId;

use crate::board::{Mutator, Reconciler, StoreChange, TaskStore};
use crate::sync::{EventLink, SyncApi, SyncChannel, SyncError};

/// One authenticated owner's live connection to their board.
///
/// Opening a session registers the user, loads the board once from server
/// truth, and starts a background pump that feeds inbound peer events to
/// the reconciler. Closing it stops the pump and tears the event link
/// down; nothing from one session leaks into the next.
#[derive(Debug)]
pub struct BoardSession<A, L> {
    owner: OwnerId,
    store: Arc<TaskStore>,
    channel: Arc<SyncChannel<A, L>>,
    mutator: Mutator<A, L>,
    reconciler: Arc<Reconciler<A, L>>,
    pump: JoinHandle<()>,
}

impl<A: SyncApi + 'static, L: EventLink + 'static> BoardSession<A, L> {
    /// Opens a session for `profile` over an already-connected channel.
    ///
    /// Returns the session and the store's change feed for the render
    /// layer. On failure the channel is closed before returning; the
    /// caller gets nothing half-started.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when registration or the initial fetch fails.
    pub async fn open(
        profile: NewUser,
        channel: SyncChannel<A, L>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<StoreChange>), SyncError> {
        let channel = Arc::new(channel);
        if let Err(e) = channel.register_user(&profile).await {
            tracing::warn!(err = %e, "user registration failed");
            channel.close();
            return Err(e);
        }

        let owner = profile.uid;
        let (store, changes) = TaskStore::new();
        let store = Arc::new(store);
        let reconciler = Arc::new(Reconciler::new(
            owner.clone(),
            Arc::clone(&store),
            Arc::clone(&channel),
        ));
        if let Err(e) = reconciler.resync().await {
            tracing::warn!(err = %e, "initial board fetch failed");
            channel.close();
            return Err(e);
        }

        let pump = tokio::spawn(pump_events(
            Arc::clone(&channel),
            Arc::clone(&reconciler),
        ));
        let mutator = Mutator::new(
            owner.clone(),
            Arc::clone(&store),
            Arc::clone(&channel),
            Arc::clone(&reconciler),
        );
        tracing::info!(owner = %owner, "board session opened");

        Ok((
            Self {
                owner,
                store,
                channel,
                mutator,
                reconciler,
                pump,
            },
            changes,
        ))
    }

    /// The owner this session belongs to.
    #[must_use]
    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// The session's task store.
    #[must_use]
    pub const fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// The session's mutator, for user-initiated changes.
    #[must_use]
    pub const fn mutator(&self) -> &Mutator<A, L> {
        &self.mutator
    }

    /// Whether the real-time link is still up.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.channel.is_open()
    }

    /// Forces a full refetch of server truth into the store.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the fetch fails; the store is left as
    /// it was.
    pub async fn resync(&self) -> Result<(), SyncError> {
        self.reconciler.resync().await
    }

    /// Ends the session: stops the event pump and closes the link.
    pub fn close(self) {
        self.pump.abort();
        self.channel.close();
        tracing::info!(owner = %self.owner, "board session closed");
    }
}

/// Feeds inbound peer events to the reconciler until the link closes.
async fn pump_events<A: SyncApi, L: EventLink>(
    channel: Arc<SyncChannel<A, L>>,
    reconciler: Arc<Reconciler<A, L>>,
) {
    loop {
        match channel.next_event().await {
            Ok(event) => reconciler.apply_event(event),
            Err(e) => {
                tracing::debug!(err = %e, "event pump stopping");
                break;
            }
        }
    }
}
