//! Taskstore: data access for issue-tracker tasks.
//!
//! This crate maps task operations onto parameterized SQL against a
//! `PostgreSQL` `tasks` table and its `tasks_labels` association table, and
//! returns typed records to the calling service.
//!
//! # Architecture
//!
//! Taskstore follows hexagonal architecture principles:
//!
//! - **Domain**: task records, identifiers, and listing filters
//! - **Ports**: the [`task::ports::TaskRepository`] contract
//! - **Adapters**: `PostgreSQL` (Diesel + r2d2) and in-memory implementations
//!
//! # Example
//!
//! ```no_run
//! use taskstore::task::{
//!     adapters::postgres::PostgresTaskRepository,
//!     domain::{NewTask, TaskFilter},
//!     ports::TaskRepository,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = PostgresTaskRepository::open("postgres://localhost/tasks")?;
//! let id = repository.create(&NewTask::new("Write docs", "Cover the port")).await?;
//! let tasks = repository.list(TaskFilter::any().with_task(id)).await?;
//! assert_eq!(tasks.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod task;
