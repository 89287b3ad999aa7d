//! `PostgreSQL` repository implementation for task storage.

use super::{
    config::{ConnectionError, PoolConfig, TaskPgPool},
    models::{NewTaskRow, TaskLabelRow, TaskRow},
    schema::{tasks, tasks_labels},
};
use crate::task::{
    domain::{LabelId, NewTask, Task, TaskFilter, TaskId, UserId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, info, warn};

/// `PostgreSQL`-backed task repository.
///
/// Clones share the underlying pool. The pool is released when the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `database_url` with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the connection string is malformed or
    /// the database cannot be reached. No retry is attempted.
    pub fn open(database_url: &str) -> Result<Self, ConnectionError> {
        Self::connect(&PoolConfig::new(database_url))
    }

    /// Opens a pool according to `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the configuration is invalid or the
    /// database cannot be reached.
    pub fn connect(config: &PoolConfig) -> Result<Self, ConnectionError> {
        let pool = config.build_pool()?;
        info!(
            max_size = config.max_size,
            statement_timeout = ?config.statement_timeout,
            "task repository connection pool established"
        );
        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &TaskPgPool {
        &self.pool
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::query)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::query)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn list(&self, filter: TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self
            .run_blocking(move |connection| load_tasks(connection, filtered_tasks(filter)))
            .await?;
        debug!(?filter, count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    async fn create(&self, task: &NewTask) -> TaskRepositoryResult<TaskId> {
        let new_row = NewTaskRow::from(task);
        let id = self
            .run_blocking(move |connection| {
                diesel::insert_into(tasks::table)
                    .values(&new_row)
                    .returning(tasks::id)
                    .get_result::<i32>(connection)
                    .map(TaskId::new)
                    .map_err(TaskRepositoryError::query)
            })
            .await?;
        debug!(task_id = %id, "created task");
        Ok(id)
    }

    async fn find_by_author(&self, author_id: Option<UserId>) -> TaskRepositoryResult<Vec<Task>> {
        let filter = TaskFilter {
            task_id: None,
            author_id,
        };
        self.list(filter).await
    }

    async fn find_by_label(&self, label_id: LabelId) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self
            .run_blocking(move |connection| load_tasks(connection, labelled_tasks(label_id)))
            .await?;
        debug!(label_id = %label_id, count = tasks.len(), "found tasks by label");
        Ok(tasks)
    }

    async fn update_title(&self, id: TaskId, title: &str) -> TaskRepositoryResult<()> {
        let title = title.to_owned();
        let affected = self
            .run_blocking(move |connection| {
                diesel::update(tasks::table.find(id.value()))
                    .set(tasks::title.eq(title))
                    .execute(connection)
                    .map_err(TaskRepositoryError::query)
            })
            .await?;
        ensure_affected(id, affected, "update title")
    }

    async fn update_content(&self, id: TaskId, content: &str) -> TaskRepositoryResult<()> {
        let content = content.to_owned();
        let affected = self
            .run_blocking(move |connection| {
                diesel::update(tasks::table.find(id.value()))
                    .set(tasks::content.eq(content))
                    .execute(connection)
                    .map_err(TaskRepositoryError::query)
            })
            .await?;
        ensure_affected(id, affected, "update content")
    }

    async fn close(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let outcome = self
            .run_blocking(move |connection| {
                connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                    let closed = close_open_task(tx, id)?;
                    if closed > 0 {
                        return Ok(CloseOutcome::Closed);
                    }
                    if task_exists(tx, id)? {
                        Ok(CloseOutcome::AlreadyClosed)
                    } else {
                        Ok(CloseOutcome::Missing)
                    }
                })
            })
            .await?;

        match outcome {
            CloseOutcome::Closed => {
                debug!(task_id = %id, "closed task");
                Ok(())
            }
            CloseOutcome::AlreadyClosed => {
                debug!(task_id = %id, "task already closed; timestamp kept");
                Ok(())
            }
            CloseOutcome::Missing => ensure_affected(id, 0, "close"),
        }
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let removed_labels = self
            .run_blocking(move |connection| {
                connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                    let removed_labels = diesel::delete(
                        tasks_labels::table.filter(tasks_labels::task_id.eq(id.value())),
                    )
                    .execute(tx)
                    .map_err(TaskRepositoryError::query)?;
                    let removed_tasks = diesel::delete(tasks::table.find(id.value()))
                        .execute(tx)
                        .map_err(TaskRepositoryError::query)?;
                    if removed_tasks == 0 {
                        return Err(TaskRepositoryError::NotFound(id));
                    }
                    Ok(removed_labels)
                })
            })
            .await
            .inspect_err(|err| {
                if matches!(err, TaskRepositoryError::NotFound(_)) {
                    warn!(task_id = %id, "delete: task not found");
                }
            })?;
        debug!(task_id = %id, removed_labels, "deleted task");
        Ok(())
    }

    async fn attach_label(&self, id: TaskId, label_id: LabelId) -> TaskRepositoryResult<()> {
        let row = TaskLabelRow {
            task_id: id.value(),
            label_id: label_id.value(),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks_labels::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        TaskRepositoryError::NotFound(id)
                    }
                    _ => TaskRepositoryError::query(err),
                })
        })
        .await?;
        debug!(task_id = %id, label_id = %label_id, "attached label");
        Ok(())
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::query(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseOutcome {
    Closed,
    AlreadyClosed,
    Missing,
}

/// Builds the listing query for `filter`, ordered by ascending id.
pub(crate) fn filtered_tasks(filter: TaskFilter) -> tasks::BoxedQuery<'static, Pg> {
    let mut query = tasks::table.order(tasks::id.asc()).into_boxed();
    if let Some(task_id) = filter.task_id {
        query = query.filter(tasks::id.eq(task_id.value()));
    }
    if let Some(author_id) = filter.author_id {
        query = query.filter(tasks::author_id.eq(author_id.value()));
    }
    query
}

/// Builds the lookup for tasks carrying `label_id`, ordered by ascending id.
///
/// The label table is read through a subquery so repeated association rows
/// never repeat a task.
pub(crate) fn labelled_tasks(label_id: LabelId) -> tasks::BoxedQuery<'static, Pg> {
    let task_ids = tasks_labels::table
        .filter(tasks_labels::label_id.eq(label_id.value()))
        .select(tasks_labels::task_id);
    tasks::table
        .filter(tasks::id.eq_any(task_ids))
        .order(tasks::id.asc())
        .into_boxed()
}

/// Statement setting `closed` on a task that is still open.
pub(crate) const CLOSE_TASK_SQL: &str = concat!(
    "UPDATE tasks SET closed = EXTRACT(EPOCH FROM NOW())::BIGINT ",
    "WHERE id = $1 AND (closed IS NULL OR closed = 0)",
);

fn load_tasks(
    connection: &mut PgConnection,
    query: tasks::BoxedQuery<'static, Pg>,
) -> TaskRepositoryResult<Vec<Task>> {
    query
        .load::<TaskRow>(connection)
        .map(|rows| rows.into_iter().map(Task::from).collect())
        .map_err(TaskRepositoryError::query)
}

fn close_open_task(connection: &mut PgConnection, id: TaskId) -> TaskRepositoryResult<usize> {
    diesel::sql_query(CLOSE_TASK_SQL)
        .bind::<diesel::sql_types::Integer, _>(id.value())
        .execute(connection)
        .map_err(TaskRepositoryError::query)
}

fn task_exists(connection: &mut PgConnection, id: TaskId) -> TaskRepositoryResult<bool> {
    diesel::select(exists(tasks::table.find(id.value())))
        .get_result::<bool>(connection)
        .map_err(TaskRepositoryError::query)
}

fn ensure_affected(id: TaskId, affected: usize, operation: &str) -> TaskRepositoryResult<()> {
    if affected == 0 {
        warn!(task_id = %id, operation, "task not found");
        return Err(TaskRepositoryError::NotFound(id));
    }
    debug!(task_id = %id, operation, "task updated");
    Ok(())
}
