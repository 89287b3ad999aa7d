//! Task storage for Taskstore.
//!
//! Creating, listing, updating, closing, and deleting task records, plus
//! label-based lookup. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
