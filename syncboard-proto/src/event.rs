//! Real-time board change events.
//!
//! Three event kinds cross the channel between connected clients. Creations
//! and updates carry the full task so receivers can apply them wholesale;
//! deletions carry only the id.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskId};

/// A board change broadcast between connected clients.
///
/// Serialized as a tagged JSON object `{"event": …, "data": …}`. The tag
/// strings are part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum BoardEvent {
    /// A task was created and persisted.
    #[serde(rename = "taskCreated")]
    TaskCreated(Task),
    /// A task's fields changed; moves between columns arrive as updates.
    #[serde(rename = "taskUpdated")]
    TaskUpdated(Task),
    /// A task was deleted.
    #[serde(rename = "taskDeleted")]
    TaskDeleted(TaskId),
}

impl BoardEvent {
    /// The event's kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::TaskCreated(_) => EventKind::TaskCreated,
            Self::TaskUpdated(_) => EventKind::TaskUpdated,
            Self::TaskDeleted(_) => EventKind::TaskDeleted,
        }
    }

    /// Id of the task this event concerns.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        match self {
            Self::TaskCreated(task) | Self::TaskUpdated(task) => &task.id,
            Self::TaskDeleted(id) => id,
        }
    }
}

/// Discriminant of a [`BoardEvent`], usable as a subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `taskCreated` on the wire.
    TaskCreated,
    /// `taskUpdated` on the wire.
    TaskUpdated,
    /// `taskDeleted` on the wire.
    TaskDeleted,
}

impl EventKind {
    /// Wire name of the event kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "taskCreated",
            Self::TaskUpdated => "taskUpdated",
            Self::TaskDeleted => "taskDeleted",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
