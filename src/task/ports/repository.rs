//! Repository port for task persistence, lookup, and mutation.

use crate::task::domain::{LabelId, NewTask, Task, TaskFilter, TaskId, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Listings are ordered by ascending task identifier and return an empty
/// vector, not an error, when nothing matches.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Returns every task satisfying `filter`.
    async fn list(&self, filter: TaskFilter) -> TaskRepositoryResult<Vec<Task>>;

    /// Inserts a task and returns the identifier assigned by the store.
    ///
    /// The store sets `opened` to the insertion time and leaves `closed`
    /// unset.
    async fn create(&self, task: &NewTask) -> TaskRepositoryResult<TaskId>;

    /// Returns tasks written by `author_id`, or all tasks for `None`.
    async fn find_by_author(&self, author_id: Option<UserId>) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the tasks associated with `label_id`.
    async fn find_by_label(&self, label_id: LabelId) -> TaskRepositoryResult<Vec<Task>>;

    /// Replaces the title of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update_title(&self, id: TaskId, title: &str) -> TaskRepositoryResult<()>;

    /// Replaces the body of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update_content(&self, id: TaskId, content: &str) -> TaskRepositoryResult<()>;

    /// Marks a task closed at the store's current time.
    ///
    /// Closing an already closed task keeps the original timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn close(&self, id: TaskId) -> TaskRepositoryResult<()>;

    /// Deletes a task together with its label associations.
    ///
    /// Both removals happen atomically.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist;
    /// nothing is removed in that case.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()>;

    /// Associates a label with a task. Repeating an association is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn attach_label(&self, id: TaskId, label_id: LabelId) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// No task has the given identifier.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The store rejected or failed to execute a statement.
    #[error("query error: {0}")]
    Query(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a driver, pool, or runtime error.
    #[must_use]
    pub fn query(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Query(Arc::new(err))
    }
}
