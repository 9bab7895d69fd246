//! # DomainError
//!
//! Centralized error handling for the offcampus content subsystem.
//! Every failure a use case can surface maps to exactly one variant here;
//! transports translate the variant into a status code.

use thiserror::Error;

use crate::models::Report;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Missing or malformed input (blank content, rating out of range, unknown reason)
    #[error("validation error: {0}")]
    Validation(String),

    /// No identity context was supplied with the request
    #[error("authentication required")]
    AuthenticationRequired,

    /// Identity present, but the authorization rules refuse the action
    #[error("forbidden: {0}")]
    AuthorizationDenied(String),

    /// Referenced entity does not exist
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A store-level uniqueness constraint rejected the write
    #[error("conflict: {0}")]
    DuplicateConflict(String),

    /// The reporter already filed a report against this content
    #[error("content already reported")]
    DuplicateReport(Box<Report>),

    /// Transaction failure unrelated to the above (disconnect, I/O, corrupt row)
    #[error("store error: {0}")]
    Store(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::AuthorizationDenied(msg.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn store(msg: impl std::fmt::Display) -> Self {
        Self::Store(msg.to_string())
    }

    /// True for failures the client caused and can correct.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// A specialized Result type for offcampus domain logic.
pub type Result<T> = std::result::Result<T, DomainError>;
