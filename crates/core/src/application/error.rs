//! Lifecycle service errors.

use scholarflow_shared::AppError;
use thiserror::Error;

use crate::application::ports::RepositoryError;
use crate::workflow::WorkflowError;

/// Caller-facing classification of a lifecycle error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entity missing.
    NotFound,
    /// Actor lacks ownership or role authority.
    Forbidden,
    /// Duplicate application, out-of-turn review or lost concurrent update.
    Conflict,
    /// Ineligible, missing documents, or illegal state transition.
    PreconditionFailed,
    /// Malformed request.
    InvalidInput,
    /// Storage outage or inconsistent stored data.
    Internal,
}

/// Errors returned by the application lifecycle service.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Entity not found.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity type.
        entity: &'static str,
        /// Entity id.
        id: String,
    },

    /// Actor is not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The student already applied for this scholarship.
    #[error("Student already has an application for this scholarship")]
    DuplicateApplication,

    /// Another request changed the application first.
    #[error("Application was modified concurrently, reload and retry")]
    ConcurrentModification,

    /// The scholarship is not active.
    #[error("Scholarship is not open for applications")]
    ScholarshipNotOpen,

    /// The application deadline has passed.
    #[error("Application deadline has passed")]
    DeadlinePassed,

    /// No recipient slot is left.
    #[error("Scholarship has no recipient slots left")]
    NoRecipientSlots,

    /// The student does not meet the scholarship's requirements.
    #[error("Student is not eligible: {}", reasons.join("; "))]
    Ineligible {
        /// Why the student is not eligible.
        reasons: Vec<String>,
    },

    /// Required documents have not been uploaded.
    #[error("Missing required documents: {}", missing.join(", "))]
    MissingDocuments {
        /// Missing document types.
        missing: Vec<String>,
    },

    /// Workflow rule violated.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Storage failure.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for LifecycleError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::DuplicateKey(_) => Self::DuplicateApplication,
            RepositoryError::VersionConflict { .. } => Self::ConcurrentModification,
            RepositoryError::CapacityExhausted(_) => Self::NoRecipientSlots,
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            other @ RepositoryError::Unavailable(_) => Self::Repository(other),
        }
    }
}

impl LifecycleError {
    /// Creates a not found error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::DuplicateApplication | Self::ConcurrentModification => ErrorKind::Conflict,
            Self::ScholarshipNotOpen
            | Self::DeadlinePassed
            | Self::NoRecipientSlots
            | Self::Ineligible { .. }
            | Self::MissingDocuments { .. } => ErrorKind::PreconditionFailed,
            Self::Workflow(error) => match error.status_code() {
                400 => ErrorKind::InvalidInput,
                403 => ErrorKind::Forbidden,
                409 => ErrorKind::Conflict,
                422 => ErrorKind::PreconditionFailed,
                _ => ErrorKind::Internal,
            },
            Self::Repository(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::Conflict => 409,
            ErrorKind::PreconditionFailed => 422,
            ErrorKind::InvalidInput => 400,
            ErrorKind::Internal => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::DuplicateApplication => "DUPLICATE_APPLICATION",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::ScholarshipNotOpen => "SCHOLARSHIP_NOT_OPEN",
            Self::DeadlinePassed => "DEADLINE_PASSED",
            Self::NoRecipientSlots => "NO_RECIPIENT_SLOTS",
            Self::Ineligible { .. } => "NOT_ELIGIBLE",
            Self::MissingDocuments { .. } => "MISSING_DOCUMENTS",
            Self::Workflow(error) => error.error_code(),
            Self::Repository(_) => "REPOSITORY_ERROR",
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(error: LifecycleError) -> Self {
        let message = error.to_string();
        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Forbidden => Self::Forbidden(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::PreconditionFailed => Self::PreconditionFailed(message),
            ErrorKind::InvalidInput => Self::Validation(message),
            ErrorKind::Internal => match error {
                LifecycleError::Repository(_) => Self::Database(message),
                _ => Self::Internal(message),
            },
        }
    }
}
