//! Given steps for task storage BDD scenarios.

use super::world::{TaskWorld, as_id, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskstore::task::{
    domain::{LabelId, NewTask, UserId},
    ports::TaskRepository,
};

#[given(r#"a task titled "{title}" written by author {author:u64}"#)]
fn task_by_author(world: &mut TaskWorld, title: String, author: u64) -> Result<(), eyre::Report> {
    let payload = NewTask::new(title, "").with_author(UserId::new(as_id(author)?));
    let id = run_async(world.repository.create(&payload)).wrap_err("create scenario task")?;
    world.last_created = Some(id);
    Ok(())
}

#[given("the task is labelled {label:u64}")]
fn task_is_labelled(world: &mut TaskWorld, label: u64) -> Result<(), eyre::Report> {
    let id = world.current_task()?;
    let label_id = LabelId::new(as_id(label)?);
    run_async(world.repository.attach_label(id, label_id)).wrap_err("attach scenario label")?;
    Ok(())
}
