//! When steps for task storage BDD scenarios.

use super::world::{TaskWorld, as_id, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use taskstore::task::{
    domain::{TaskFilter, TaskId, UserId},
    ports::TaskRepository,
};

#[when("tasks by author {author:u64} are listed")]
fn list_by_author(world: &mut TaskWorld, author: u64) -> Result<(), eyre::Report> {
    let filter = TaskFilter::any().with_author(UserId::new(as_id(author)?));
    world.last_listing = Some(run_async(world.repository.list(filter)));
    Ok(())
}

#[when("the task is deleted")]
fn delete_task(world: &mut TaskWorld) -> Result<(), eyre::Report> {
    let id = world.current_task()?;
    run_async(world.repository.delete(id)).wrap_err("delete scenario task")?;
    Ok(())
}

#[when(r#"the title of task {id:u64} is changed to "{title}""#)]
fn change_title(world: &mut TaskWorld, id: u64, title: String) -> Result<(), eyre::Report> {
    let task_id = TaskId::new(as_id(id)?);
    world.last_update = Some(run_async(world.repository.update_title(task_id, &title)));
    Ok(())
}
