//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`AppError`]
//! via `From`, so handlers and adapters can use `?` throughout.

use crate::validation::ValidationErrors;

/// Top-level error returned by repositories, handlers, and the mediator.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The request was rejected by one or more validation rules.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The addressed record does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The backing store failed; the source is passed through untouched.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No handler was registered for the dispatched request type.
    #[error("no handler registered for request {0}")]
    NoHandler(&'static str),
}

impl AppError {
    /// Whether this error is user-correctable (validation or not-found).
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

/// A lookup by key matched no record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} with id {id} not found")]
pub struct NotFoundError {
    /// Entity kind, e.g. `"Client"`.
    pub entity: &'static str,
    /// The key that was looked up, rendered as text.
    pub id: String,
}
