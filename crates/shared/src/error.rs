//! Application-wide error types.
//!
//! Domain crates keep their own error enums and convert into [`AppError`]
//! at the boundary where a transport layer maps it to a response.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Actor lacks ownership or role authority.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The entity is not in a state that allows the operation.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Conflict (duplicate entry, lost concurrent update, out-of-turn action).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::PreconditionFailed(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PreconditionFailed(_) => "PRECONDITION_FAILED",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::forbidden(AppError::Forbidden("not yours".into()), 403, "FORBIDDEN")]
    #[case::missing(AppError::NotFound("application".into()), 404, "NOT_FOUND")]
    #[case::bad_score(AppError::Validation("score".into()), 400, "VALIDATION_ERROR")]
    #[case::wrong_state(AppError::PreconditionFailed("draft".into()), 422, "PRECONDITION_FAILED")]
    #[case::duplicate(AppError::Conflict("duplicate".into()), 409, "CONFLICT")]
    #[case::storage(AppError::Database("offline".into()), 500, "DATABASE_ERROR")]
    #[case::internal(AppError::Internal("boom".into()), 500, "INTERNAL_ERROR")]
    fn maps_to_transport_codes(#[case] error: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(error.status_code(), status);
        assert_eq!(error.error_code(), code);
    }

    #[test]
    fn display_carries_context() {
        assert_eq!(
            AppError::PreconditionFailed("application is approved".into()).to_string(),
            "Precondition failed: application is approved"
        );
    }
}
