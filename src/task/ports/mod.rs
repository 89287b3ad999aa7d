//! Port contracts for task storage.
//!
//! Ports define infrastructure-agnostic interfaces implemented by adapters.

pub mod repository;

pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
