//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors a custom authentication strategy can report.
///
/// The engine never propagates these: a failing strategy is a rejection.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The verification backend could not be reached.
    #[error("authentication backend unavailable: {0}")]
    Unavailable(String),

    /// The credentials could not be parsed.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns `true` if retrying the request might succeed.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
