//! In-memory repository for task storage tests.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{LabelId, NewTask, PersistedTaskData, Task, TaskFilter, TaskId, UserId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Identifiers start at 1 and increase monotonically, mirroring a `SERIAL`
/// column. Timestamps come from the injected clock.
pub struct InMemoryTaskRepository<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    state: Arc<RwLock<InMemoryTaskState>>,
    clock: Arc<C>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    last_id: i32,
    tasks: BTreeMap<TaskId, Task>,
    label_index: HashMap<LabelId, BTreeSet<TaskId>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty repository backed by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InMemoryTaskRepository<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty repository using `clock` for timestamps.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryTaskState::default())),
            clock,
        }
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::query(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::query(std::io::Error::other(err.to_string()))
        })
    }

    fn now(&self) -> i64 {
        self.clock.utc().timestamp()
    }
}

impl<C> Clone for InMemoryTaskRepository<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> fmt::Debug for InMemoryTaskRepository<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryTaskRepository")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Rebuilds `task` with `edit` applied to its persisted fields.
fn edit_task(task: &Task, edit: impl FnOnce(&mut PersistedTaskData)) -> Task {
    let mut data = PersistedTaskData {
        id: task.id(),
        opened: task.opened(),
        closed: task.closed(),
        author_id: task.author_id(),
        assigned_id: task.assigned_id(),
        title: task.title().to_owned(),
        content: task.content().to_owned(),
    };
    edit(&mut data);
    Task::from_persisted(data)
}

fn modify_task(
    state: &mut InMemoryTaskState,
    id: TaskId,
    edit: impl FnOnce(&mut PersistedTaskData),
) -> TaskRepositoryResult<()> {
    let task = state
        .tasks
        .get_mut(&id)
        .ok_or(TaskRepositoryError::NotFound(id))?;
    *task = edit_task(task, edit);
    Ok(())
}

fn filtered(state: &InMemoryTaskState, filter: TaskFilter) -> Vec<Task> {
    state
        .tasks
        .values()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect()
}

#[async_trait]
impl<C> TaskRepository for InMemoryTaskRepository<C>
where
    C: Clock + Send + Sync,
{
    async fn list(&self, filter: TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(filtered(&state, filter))
    }

    async fn create(&self, task: &NewTask) -> TaskRepositoryResult<TaskId> {
        let opened = self.now();
        let mut state = self.write()?;
        let next = state.last_id.checked_add(1).ok_or_else(|| {
            TaskRepositoryError::query(std::io::Error::other("task identifier space exhausted"))
        })?;
        state.last_id = next;

        let id = TaskId::new(next);
        let record = Task::from_persisted(PersistedTaskData {
            id,
            opened,
            closed: None,
            author_id: task.author_id(),
            assigned_id: task.assigned_id(),
            title: task.title().to_owned(),
            content: task.content().to_owned(),
        });
        state.tasks.insert(id, record);
        Ok(id)
    }

    async fn find_by_author(&self, author_id: Option<UserId>) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let filter = TaskFilter {
            task_id: None,
            author_id,
        };
        Ok(filtered(&state, filter))
    }

    async fn find_by_label(&self, label_id: LabelId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let tasks = state
            .label_index
            .get(&label_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.tasks.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(tasks)
    }

    async fn update_title(&self, id: TaskId, title: &str) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        modify_task(&mut state, id, |data| title.clone_into(&mut data.title))
    }

    async fn update_content(&self, id: TaskId, content: &str) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        modify_task(&mut state, id, |data| content.clone_into(&mut data.content))
    }

    async fn close(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let closed_at = self.now();
        let mut state = self.write()?;
        modify_task(&mut state, id, |data| {
            if data.closed.is_none() {
                data.closed = Some(closed_at);
            }
        })
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.remove(&id).is_none() {
            return Err(TaskRepositoryError::NotFound(id));
        }
        state.label_index.retain(|_, ids| {
            ids.remove(&id);
            !ids.is_empty()
        });
        Ok(())
    }

    async fn attach_label(&self, id: TaskId, label_id: LabelId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&id) {
            return Err(TaskRepositoryError::NotFound(id));
        }
        state.label_index.entry(label_id).or_default().insert(id);
        Ok(())
    }
}
