//! Shared primitives for all scopegate crates.

#![forbid(unsafe_code)]

/// Requesting principal primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::Requester;

/// Result type used across scopegate crates.
pub type AppResult<T> = Result<T, AppError>;

/// Organization identifier used as the partition key for roles and assignments.
///
/// Organization `0` is the global organization: roles and assignments stored
/// under it are visible from every organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrgId(i64);

impl OrgId {
    /// The global organization.
    pub const GLOBAL: Self = Self(0);

    /// Creates an organization identifier from a stored value.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying stored value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Returns whether this is the global organization.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0 == 0
    }
}

impl Display for OrgId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is not allowed to see or change a resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Persistence collaborator failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
