//! Workflow error types for application lifecycle management.
//!
//! This module defines all error types that can occur while validating
//! status transitions, step ordering and reviewer authority.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::workflow::types::ApplicationStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Attempted a transition the current status does not allow.
    #[error("Invalid status transition: cannot {action} an application that is {from}")]
    InvalidTransition {
        /// The current status.
        from: ApplicationStatus,
        /// The attempted operation.
        action: &'static str,
    },

    /// An approval workflow must contain at least one step.
    #[error("Approval workflow has no steps")]
    EmptyWorkflow,

    /// An approval workflow step name is blank.
    #[error("Approval workflow contains a blank step name")]
    BlankStep,

    /// An approval workflow lists the same step twice.
    #[error("Approval workflow lists step {0} more than once")]
    DuplicateStep(String),

    /// The application points at a step the workflow does not contain.
    #[error("Step {0} is not part of the approval workflow")]
    UnknownStep(String),

    /// The application is in review but has no current step.
    #[error("Application has no current approval step")]
    NoCurrentStep,

    /// No role holds the step, so only an administrator may act on it.
    #[error("No role is mapped to workflow step {0}")]
    UnmappedStep(String),

    /// Role name in configuration is not recognised.
    #[error("Unknown role {0}")]
    UnknownRole(String),

    /// The reviewer's role does not hold any step of this workflow.
    #[error("Role {role} is not authorized to review step {step}")]
    NotAuthorizedForStep {
        /// The reviewer's role.
        role: String,
        /// The current step.
        step: String,
    },

    /// The reviewer holds a different step than the current one.
    #[error("Role {role} reviews step {held_step}, but the application is at step {current_step}")]
    OutOfTurn {
        /// The reviewer's role.
        role: String,
        /// The step the role holds.
        held_step: String,
        /// The step the application is at.
        current_step: String,
    },

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Review score outside the accepted range.
    #[error("Review score {0} is outside the range 0-100")]
    ScoreOutOfRange(Decimal),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::EmptyWorkflow
            | Self::BlankStep
            | Self::DuplicateStep(_)
            | Self::UnknownRole(_)
            | Self::RejectionReasonRequired
            | Self::ScoreOutOfRange(_) => 400,

            Self::UnmappedStep(_) | Self::NotAuthorizedForStep { .. } => 403,

            Self::OutOfTurn { .. } => 409,

            Self::InvalidTransition { .. } | Self::NoCurrentStep => 422,

            Self::UnknownStep(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::EmptyWorkflow => "EMPTY_WORKFLOW",
            Self::BlankStep => "BLANK_WORKFLOW_STEP",
            Self::DuplicateStep(_) => "DUPLICATE_WORKFLOW_STEP",
            Self::UnknownStep(_) => "UNKNOWN_WORKFLOW_STEP",
            Self::NoCurrentStep => "NO_CURRENT_STEP",
            Self::UnmappedStep(_) => "UNMAPPED_WORKFLOW_STEP",
            Self::UnknownRole(_) => "UNKNOWN_ROLE",
            Self::NotAuthorizedForStep { .. } => "NOT_AUTHORIZED_FOR_STEP",
            Self::OutOfTurn { .. } => "OUT_OF_TURN_REVIEW",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::ScoreOutOfRange(_) => "SCORE_OUT_OF_RANGE",
        }
    }
}
