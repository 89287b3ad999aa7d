//! Optional filters for task listing.

use super::{Task, TaskId, UserId};

/// Conjunctive filter for task listings.
///
/// A `None` field matches every task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Restrict to a single task.
    pub task_id: Option<TaskId>,
    /// Restrict to tasks written by this author.
    pub author_id: Option<UserId>,
}

impl TaskFilter {
    /// Filter matching all tasks.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            task_id: None,
            author_id: None,
        }
    }

    /// Builds a filter from the legacy `0 == any` convention.
    #[must_use]
    pub const fn from_sentinels(task_id: i32, author_id: i32) -> Self {
        Self {
            task_id: TaskId::from_sentinel(task_id),
            author_id: UserId::from_sentinel(author_id),
        }
    }

    /// Restricts the filter to one task.
    #[must_use]
    pub const fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Restricts the filter to one author.
    #[must_use]
    pub const fn with_author(mut self, author_id: UserId) -> Self {
        self.author_id = Some(author_id);
        self
    }

    /// Returns `true` when `task` satisfies every present condition.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let id_matches = self.task_id.is_none_or(|id| id == task.id());
        let author_matches = self
            .author_id
            .is_none_or(|author| task.author_id() == Some(author));
        id_matches && author_matches
    }
}
