//! `PostgreSQL` adapters for task storage.
//!
//! All Diesel work runs on tokio's blocking pool, one pooled connection per
//! call.

mod config;
mod models;
mod repository;
mod schema;

pub use config::{
    CONNECT_TIMEOUT_ENV, ConnectionError, DATABASE_URL_ENV, POOL_MAX_SIZE_ENV, PoolConfig,
    STATEMENT_TIMEOUT_ENV, TaskPgPool,
};
pub use repository::PostgresTaskRepository;

#[cfg(test)]
pub(crate) use repository::{CLOSE_TASK_SQL, filtered_tasks, labelled_tasks};
