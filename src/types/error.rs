//! Core error kinds.
//!
//! `MatrixBackendError` deliberately has no variant here — it never leaves
//! `services::matrix`, which downgrades it to a tagged fallback result instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("authorization error: {0}")]
    Authorization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    /// Stable error code surfaced in `ErrorResponse`.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::Authorization(_) => "AUTHORIZATION_ERROR",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Persistence(_) => "PERSISTENCE_ERROR",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
