//! offcampus/crates/storage-adapters/src/lib.rs
//!
//! Persistence adapters for the `domains` ports. Each backend sits behind a
//! cargo feature so the binary links only what it is configured to use.

#[cfg(feature = "db-sqlite")]
pub mod sqlite;

#[cfg(feature = "db-sqlite")]
pub use sqlite::{SqliteStore, SqliteUnitOfWork};
