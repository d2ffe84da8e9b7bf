//! Request and response payloads for the persistence API.
//!
//! These types mirror the JSON bodies of the five REST routes: list tasks,
//! register user, create task, update task, delete task. Bound checks live
//! here so the engine can pre-flight a request and the hub can enforce the
//! same rules authoritatively.

use serde::{Deserialize, Serialize};

use crate::task::{
    Category, OwnerId, Task, TaskId, Timestamp, ValidationError, check_description, check_title,
};

/// Body of `POST /users`: the authenticated profile to register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Identity-provider uid; becomes the owner of every task the user
    /// creates.
    pub uid: OwnerId,
    /// Account email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl NewUser {
    /// Creates a registration payload.
    #[must_use]
    pub fn new(uid: impl Into<OwnerId>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            name: name.into(),
        }
    }
}

/// Body of `POST /tasks`: a validated draft plus the placement the client
/// computed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Trimmed title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owner the task is created for.
    #[serde(rename = "uid")]
    pub owner: OwnerId,
    /// Column the task starts in.
    pub category: Category,
    /// Position within that column.
    pub position: u32,
}

impl NewTask {
    /// Checks the field bounds the service enforces.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the trimmed title is empty or a
    /// field exceeds its bound.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title(self.title.trim())?;
        check_description(self.description.as_deref())
    }
}

/// Body of `PUT /tasks/{id}`: every task field except the immutable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// Replacement title.
    pub title: String,
    /// Replacement description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owner uid; the service treats this as immutable and ignores changes.
    #[serde(rename = "uid")]
    pub owner: OwnerId,
    /// Column the task should live in.
    pub category: Category,
    /// Position within that column.
    pub position: u32,
    /// Original creation time, carried through unchanged.
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
}

impl TaskUpdate {
    /// Builds the update payload describing a task's current state.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            owner: task.owner.clone(),
            category: task.category,
            position: task.position,
            created_at: task.created_at,
        }
    }

    /// Reassembles a full [`Task`] from this update and the path id.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            owner: self.owner,
            title: self.title,
            description: self.description,
            category: self.category,
            position: self.position,
            created_at: self.created_at,
        }
    }

    /// Checks the field bounds the service enforces.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the trimmed title is empty or a
    /// field exceeds its bound.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title(self.title.trim())?;
        check_description(self.description.as_deref())
    }
}
