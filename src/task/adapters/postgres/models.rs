//! Diesel row models for task persistence.

use super::schema::{tasks, tasks_labels};
use crate::task::domain::{NewTask, PersistedTaskData, Task, TaskId, UserId};
use diesel::prelude::*;

/// Query result row for task records.
///
/// Field order matches the `tasks` column order so boxed table queries can
/// load rows without an explicit selection. Every non-key column may be
/// `NULL` in databases created outside the shipped migration.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Serial task identifier.
    pub id: i32,
    /// Opening time in epoch seconds.
    pub opened: Option<i64>,
    /// Closing time in epoch seconds.
    pub closed: Option<i64>,
    /// Author identifier.
    pub author_id: Option<i32>,
    /// Assignee identifier.
    pub assigned_id: Option<i32>,
    /// Title.
    pub title: Option<String>,
    /// Body.
    pub content: Option<String>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let TaskRow {
            id,
            opened,
            closed,
            author_id,
            assigned_id,
            title,
            content,
        } = row;

        Self::from_persisted(PersistedTaskData {
            id: TaskId::new(id),
            opened: opened.unwrap_or_default(),
            closed: closed.filter(|seconds| *seconds != 0),
            author_id: author_id.and_then(UserId::from_sentinel),
            assigned_id: assigned_id.and_then(UserId::from_sentinel),
            title: title.unwrap_or_default(),
            content: content.unwrap_or_default(),
        })
    }
}

/// Insert model for task records.
///
/// `None` fields are sent as `DEFAULT` so the column defaults apply.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Title.
    pub title: String,
    /// Body.
    pub content: String,
    /// Author identifier.
    pub author_id: Option<i32>,
    /// Assignee identifier.
    pub assigned_id: Option<i32>,
}

impl From<&NewTask> for NewTaskRow {
    fn from(task: &NewTask) -> Self {
        Self {
            title: task.title().to_owned(),
            content: task.content().to_owned(),
            author_id: task.author_id().map(UserId::value),
            assigned_id: task.assigned_id().map(UserId::value),
        }
    }
}

/// Insert model for label associations.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = tasks_labels)]
pub struct TaskLabelRow {
    /// Associated task.
    pub task_id: i32,
    /// Associated label.
    pub label_id: i32,
}
