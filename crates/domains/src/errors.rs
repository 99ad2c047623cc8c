//! # DomainError
//!
//! Centralized error handling for the TickSolve workspace.
//! No variant is fatal: every failure degrades to a user-visible message
//! while the caller keeps its prior state.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found (e.g., Ticket, Student)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Guard condition unmet (e.g., blank title, missing category)
    #[error("validation error: {0}")]
    Validation(String),

    /// Bad credentials or a missing/expired session
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Too many failed login attempts; locked out for `retry_after_secs`
    #[error("Too many login attempts. Please try again in {retry_after_secs} seconds.")]
    RateLimited { retry_after_secs: u64 },

    /// A call across the authentication or persistence boundary failed
    #[error("network error: {0}")]
    Network(String),

    /// Infrastructure failure (e.g., attempt store unreadable)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound(kind.into(), id.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// A specialized Result type for TickSolve logic.
pub type Result<T> = std::result::Result<T, DomainError>;
