//! Task entity types shared by the sync engine and the hub.
//!
//! Defines the board's data model: opaque identifiers, the fixed category
//! set, and the [`Task`] entity with its field bounds. All types serialize
//! to the JSON shapes used by both the persistence API and the event
//! channel.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_CHARS: usize = 50;

/// Maximum allowed task description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Unique identifier for a task, assigned by the persistence service on
/// creation and immutable thereafter.
///
/// Clients never mint task ids; user input that has not been persisted yet
/// is a [`TaskDraft`], which carries no id at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    ///
    /// Only the persistence side calls this; the engine treats ids as
    /// opaque values.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a task's owner, issued by the external identity provider.
///
/// Opaque to this protocol and serialized as `uid` wherever it appears on
/// the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates an owner identifier from an identity-provider uid.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Returns the uid as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(uid: &str) -> Self {
        Self(uid.to_string())
    }
}

impl From<String> for OwnerId {
    fn from(uid: String) -> Self {
        Self(uid)
    }
}

/// Board column a task lives in.
///
/// The set is fixed and ordered; listings group tasks by this order before
/// sorting by position. The wire strings are part of the persistence
/// contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Work not started yet; newly created tasks land here.
    #[serde(rename = "To-Do")]
    Todo,
    /// Work actively underway.
    #[serde(rename = "In Progress")]
    InProgress,
    /// Finished work.
    #[serde(rename = "Done")]
    Done,
}

impl Category {
    /// All categories in board order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Wire name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "To-Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Millisecond-precision UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Creates a timestamp from milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// One work item on the board.
///
/// `position` values are unique and dense (`0..n-1`, no gaps) within each
/// `(owner, category)` partition; the engine's reorder logic maintains that
/// invariant and the hub's listing relies on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned by the persistence service on creation.
    pub id: TaskId,
    /// Owner of the task; set at creation, immutable.
    #[serde(rename = "uid")]
    pub owner: OwnerId,
    /// Short label shown on the card; bounded by [`MAX_TITLE_CHARS`].
    pub title: String,
    /// Optional longer text, bounded by [`MAX_DESCRIPTION_CHARS`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Column the task currently lives in.
    pub category: Category,
    /// Zero-based ordinal within the owner's column.
    pub position: u32,
    /// When the service created the task.
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
}

/// Error returned when task fields fail validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Title is empty after trimming whitespace.
    #[error("task title is empty")]
    EmptyTitle,
    /// Title exceeds [`MAX_TITLE_CHARS`].
    #[error("task title too long ({len} characters, max {max})")]
    TitleTooLong {
        /// Actual title length in characters.
        len: usize,
        /// Maximum allowed length in characters.
        max: usize,
    },
    /// Description exceeds [`MAX_DESCRIPTION_CHARS`].
    #[error("task description too long ({len} characters, max {max})")]
    DescriptionTooLong {
        /// Actual description length in characters.
        len: usize,
        /// Maximum allowed length in characters.
        max: usize,
    },
}

/// Checks an already-trimmed title against the protocol bounds.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyTitle`] for an empty title, or
/// [`ValidationError::TitleTooLong`] past [`MAX_TITLE_CHARS`].
pub fn check_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong {
            len,
            max: MAX_TITLE_CHARS,
        });
    }
    Ok(())
}

/// Checks an optional description against the protocol bounds.
///
/// # Errors
///
/// Returns [`ValidationError::DescriptionTooLong`] past
/// [`MAX_DESCRIPTION_CHARS`].
pub fn check_description(description: Option<&str>) -> Result<(), ValidationError> {
    if let Some(desc) = description {
        let len = desc.chars().count();
        if len > MAX_DESCRIPTION_CHARS {
            return Err(ValidationError::DescriptionTooLong {
                len,
                max: MAX_DESCRIPTION_CHARS,
            });
        }
    }
    Ok(())
}

/// User input for a task that has not been persisted yet.
///
/// A draft carries no id, owner, category, or position; the mutator fills
/// those in when it builds the create request, and the returned canonical
/// [`Task`] is what enters the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDraft {
    /// Proposed title; trimmed during normalization.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
}

impl TaskDraft {
    /// Creates a draft from a title and optional description.
    #[must_use]
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
        }
    }

    /// Trims the title and checks all field bounds, returning the
    /// normalized draft a create or edit request should carry.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the trimmed title is empty or a
    /// field exceeds its bound.
    pub fn normalize(&self) -> Result<Self, ValidationError> {
        let title = self.title.trim();
        check_title(title)?;
        check_description(self.description.as_deref())?;
        Ok(Self {
            title: title.to_string(),
            description: self.description.clone(),
        })
    }
}
