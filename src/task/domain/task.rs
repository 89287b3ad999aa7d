//! Task record and the payload used to create one.

use super::{TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue-tracker task as stored in the `tasks` table.
///
/// Timestamps are epoch seconds assigned by the store: `opened` at insert
/// time and `closed` once, when the task is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    opened: i64,
    closed: Option<i64>,
    author_id: Option<UserId>,
    assigned_id: Option<UserId>,
    title: String,
    content: String,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Epoch seconds at which the task was opened.
    pub opened: i64,
    /// Epoch seconds at which the task was closed, if it was.
    pub closed: Option<i64>,
    /// Author, if recorded.
    pub author_id: Option<UserId>,
    /// Assignee, if any.
    pub assigned_id: Option<UserId>,
    /// Task title.
    pub title: String,
    /// Free-form task body.
    pub content: String,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            opened: data.opened,
            closed: data.closed,
            author_id: data.author_id,
            assigned_id: data.assigned_id,
            title: data.title,
            content: data.content,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the opening time in epoch seconds.
    #[must_use]
    pub const fn opened(&self) -> i64 {
        self.opened
    }

    /// Returns the closing time in epoch seconds, if closed.
    #[must_use]
    pub const fn closed(&self) -> Option<i64> {
        self.closed
    }

    /// Returns `true` once the task has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed.is_some()
    }

    /// Returns the author, if recorded.
    #[must_use]
    pub const fn author_id(&self) -> Option<UserId> {
        self.author_id
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assigned_id(&self) -> Option<UserId> {
        self.assigned_id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the body.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the opening time as a UTC timestamp.
    ///
    /// `None` only when the stored value is outside chrono's range.
    #[must_use]
    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.opened, 0)
    }

    /// Returns the closing time as a UTC timestamp.
    #[must_use]
    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
    }
}

/// Values supplied by the caller when creating a task.
///
/// Identifier and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    content: String,
    author_id: Option<UserId>,
    assigned_id: Option<UserId>,
}

impl NewTask {
    /// Creates a payload with no author or assignee.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author_id: None,
            assigned_id: None,
        }
    }

    /// Records the task author.
    #[must_use]
    pub const fn with_author(mut self, author_id: UserId) -> Self {
        self.author_id = Some(author_id);
        self
    }

    /// Assigns the task to a user.
    #[must_use]
    pub const fn with_assignee(mut self, assigned_id: UserId) -> Self {
        self.assigned_id = Some(assigned_id);
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the body.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the author, if set.
    #[must_use]
    pub const fn author_id(&self) -> Option<UserId> {
        self.author_id
    }

    /// Returns the assignee, if set.
    #[must_use]
    pub const fn assigned_id(&self) -> Option<UserId> {
        self.assigned_id
    }
}
