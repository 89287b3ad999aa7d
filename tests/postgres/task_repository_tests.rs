//! `PostgreSQL` integration tests for task storage operations.

use super::helpers::{BoxError, TaskTestContext, context, count_label_rows, execute_sql};
use rstest::rstest;
use taskstore::task::{
    adapters::postgres::PostgresTaskRepository,
    domain::{LabelId, NewTask, Task, TaskFilter, TaskId, UserId},
    ports::{TaskRepository, TaskRepositoryError},
};

async fn seed_authors(repository: &PostgresTaskRepository) -> Result<Vec<TaskId>, BoxError> {
    let mut ids = Vec::new();
    for (title, author) in [("first", 10), ("second", 10), ("third", 20)] {
        let payload = NewTask::new(title, "body").with_author(UserId::new(author));
        ids.push(repository.create(&payload).await?);
    }
    Ok(ids)
}

async fn fetch(repository: &PostgresTaskRepository, id: TaskId) -> Result<Task, BoxError> {
    let mut found = repository.list(TaskFilter::any().with_task(id)).await?;
    found.pop().ok_or_else(|| format!("task {id} missing").into())
}

fn ids_of(tasks: &[Task]) -> Vec<TaskId> {
    tasks.iter().map(Task::id).collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TASKSTORE_TEST_DATABASE_URL"]
async fn postgres_create_and_list_round_trip(
    #[future] context: Result<TaskTestContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let repository = &ctx.repository;

    let first = repository.create(&NewTask::new("t", "c")).await?;
    let second = repository.create(&NewTask::new("t", "c")).await?;
    assert_ne!(first, second);

    let task = fetch(repository, first).await?;
    assert_eq!(task.title(), "t");
    assert_eq!(task.content(), "c");
    assert_eq!(task.closed(), None);
    assert_eq!(task.author_id(), None);
    assert_eq!(task.assigned_id(), None);
    assert!(task.opened() > 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TASKSTORE_TEST_DATABASE_URL"]
async fn postgres_list_filters_by_author_in_id_order(
    #[future] context: Result<TaskTestContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let repository = &ctx.repository;
    let ids = seed_authors(repository).await?;

    let all = repository.list(TaskFilter::any()).await?;
    let by_author = repository.list(TaskFilter::from_sentinels(0, 10)).await?;
    let by_any_author = repository.find_by_author(None).await?;

    assert_eq!(ids_of(&all), ids);
    assert_eq!(ids_of(&by_author), ids.get(..2).ok_or("two seeded ids")?.to_vec());
    assert_eq!(all, by_any_author);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TASKSTORE_TEST_DATABASE_URL"]
async fn postgres_both_filters_require_matching_author(
    #[future] context: Result<TaskTestContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let repository = &ctx.repository;
    let ids = seed_authors(repository).await?;
    let third = *ids.last().ok_or("seeded ids")?;

    let matching = repository
        .list(TaskFilter::any().with_task(third).with_author(UserId::new(20)))
        .await?;
    let mismatched = repository
        .list(TaskFilter::any().with_task(third).with_author(UserId::new(10)))
        .await?;

    assert_eq!(ids_of(&matching), vec![third]);
    assert!(mismatched.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TASKSTORE_TEST_DATABASE_URL"]
async fn postgres_find_by_label_returns_joined_tasks(
    #[future] context: Result<TaskTestContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let repository = &ctx.repository;
    let ids = seed_authors(repository).await?;
    let (first, second, third) = match ids.as_slice() {
        [a, b, c] => (*a, *b, *c),
        _ => return Err("expected three seeded tasks".into()),
    };
    let bug = LabelId::new(5);

    repository.attach_label(third, bug).await?;
    repository.attach_label(first, bug).await?;
    repository.attach_label(first, bug).await?;
    repository.attach_label(second, LabelId::new(6)).await?;

    let found = repository.find_by_label(bug).await?;
    assert_eq!(ids_of(&found), vec![first, third]);
    assert!(repository.find_by_label(LabelId::new(99)).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TASKSTORE_TEST_DATABASE_URL"]
async fn postgres_find_by_label_ignores_repeated_association_rows(
    #[future] context: Result<TaskTestContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let repository = &ctx.repository;
    let id = repository.create(&NewTask::new("t", "c")).await?;

    execute_sql(
        repository,
        format!(
            "ALTER TABLE tasks_labels DROP CONSTRAINT tasks_labels_pkey; \
             INSERT INTO tasks_labels (task_id, label_id) VALUES ({id}, 5), ({id}, 5);"
        ),
    )
    .await?;

    let found = repository.find_by_label(LabelId::new(5)).await?;
    assert_eq!(ids_of(&found), vec![id]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TASKSTORE_TEST_DATABASE_URL"]
async fn postgres_null_columns_do_not_break_listing(
    #[future] context: Result<TaskTestContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let repository = &ctx.repository;

    execute_sql(
        repository,
        "ALTER TABLE tasks \
             ALTER COLUMN opened DROP NOT NULL, \
             ALTER COLUMN title DROP NOT NULL, \
             ALTER COLUMN content DROP NOT NULL; \
         INSERT INTO tasks (opened, title, content) VALUES (NULL, 'legacy', NULL), (7, NULL, 'body');",
    )
    .await?;

    let tasks = repository.list(TaskFilter::any()).await?;
    let (legacy, untitled) = match tasks.as_slice() {
        [a, b] => (a, b),
        _ => return Err(format!("expected two tasks, got {}", tasks.len()).into()),
    };
    assert_eq!(legacy.title(), "legacy");
    assert_eq!(legacy.content(), "");
    assert_eq!(legacy.opened(), 0);
    assert_eq!(untitled.title(), "");
    assert_eq!(untitled.content(), "body");
    assert_eq!(untitled.opened(), 7);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TASKSTORE_TEST_DATABASE_URL"]
async fn postgres_updates_change_only_their_field(
    #[future] context: Result<TaskTestContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let repository = &ctx.repository;
    let id = repository.create(&NewTask::new("t", "c")).await?;

    repository.update_title(id, "t2").await?;
    let retitled = fetch(repository, id).await?;
    assert_eq!(retitled.title(), "t2");
    assert_eq!(retitled.content(), "c");

    repository.update_content(id, "c2").await?;
    let rewritten = fetch(repository, id).await?;
    assert_eq!(rewritten.title(), "t2");
    assert_eq!(rewritten.content(), "c2");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TASKSTORE_TEST_DATABASE_URL"]
async fn postgres_close_sets_timestamp_once(
    #[future] context: Result<TaskTestContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let repository = &ctx.repository;
    let id = repository.create(&NewTask::new("t", "c")).await?;

    repository.close(id).await?;
    let closed = fetch(repository, id).await?;
    let closed_at = closed.closed().ok_or("task should be closed")?;
    assert!(closed_at >= closed.opened());

    repository.close(id).await?;
    let reclosed = fetch(repository, id).await?;
    assert_eq!(reclosed.closed(), Some(closed_at));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TASKSTORE_TEST_DATABASE_URL"]
async fn postgres_delete_removes_task_and_label_rows(
    #[future] context: Result<TaskTestContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let repository = &ctx.repository;
    let id = repository.create(&NewTask::new("t", "c")).await?;
    let keep = repository.create(&NewTask::new("keep", "c")).await?;
    repository.attach_label(id, LabelId::new(1)).await?;
    repository.attach_label(id, LabelId::new(2)).await?;
    repository.attach_label(keep, LabelId::new(1)).await?;

    repository.delete(id).await?;

    let remaining = repository.list(TaskFilter::any()).await?;
    assert_eq!(ids_of(&remaining), vec![keep]);
    assert_eq!(count_label_rows(repository, id.value()).await?, 0);
    assert_eq!(count_label_rows(repository, keep.value()).await?, 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TASKSTORE_TEST_DATABASE_URL"]
async fn postgres_missing_task_reports_not_found(
    #[future] context: Result<TaskTestContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let repository = &ctx.repository;
    let missing = TaskId::new(4242);

    let results = [
        repository.update_title(missing, "t").await,
        repository.update_content(missing, "c").await,
        repository.close(missing).await,
        repository.delete(missing).await,
        repository.attach_label(missing, LabelId::new(1)).await,
    ];

    for result in results {
        assert!(
            matches!(result, Err(TaskRepositoryError::NotFound(id)) if id == missing),
            "unexpected result: {result:?}"
        );
    }
    Ok(())
}
