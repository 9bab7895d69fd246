//! offcampus/crates/domains/src/lib.rs
//!
//! The central domain model, rules and port definitions for the offcampus
//! moderated-content subsystem. No I/O lives here.

pub mod authz;
pub mod chat;
pub mod errors;
pub mod identity;
pub mod models;
pub mod pagination;
pub mod ports;
pub mod validation;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use identity::*;
pub use models::*;
pub use pagination::*;
