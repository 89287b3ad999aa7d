//! Domain model for task storage.
//!
//! The task domain holds the record shape, typed identifiers, and listing
//! filters while keeping all infrastructure concerns outside of the domain
//! boundary.

mod filter;
mod ids;
mod task;

pub use filter::TaskFilter;
pub use ids::{LabelId, TaskId, UserId};
pub use task::{NewTask, PersistedTaskData, Task};
