//! Application state machine.
//!
//! This module validates the lifecycle transitions that are not review
//! decisions (submit, withdraw, documents requested/provided) and the
//! guards for editing and deleting.

use chrono::Utc;

use crate::workflow::error::WorkflowError;
use crate::workflow::steps::ApprovalWorkflow;
use crate::workflow::types::{ApplicationStatus, WorkflowTransition};

/// Stateless service for application status transitions.
///
/// All methods are associated functions that validate a transition from
/// the current status and return the `WorkflowTransition` to apply.
pub struct WorkflowService;

impl WorkflowService {
    /// Submit a draft application into its scholarship's workflow.
    ///
    /// # Arguments
    /// * `current_status` - The current status of the application
    /// * `workflow` - The scholarship's approval workflow
    ///
    /// # Returns
    /// * `Ok(WorkflowTransition::Submit)` positioned at the first step
    /// * `Err(WorkflowError::InvalidTransition)` if not in Draft status
    pub fn submit(
        current_status: ApplicationStatus,
        workflow: &ApprovalWorkflow,
    ) -> Result<WorkflowTransition, WorkflowError> {
        if !current_status.can_be_submitted() {
            return Err(WorkflowError::InvalidTransition {
                from: current_status,
                action: "submit",
            });
        }

        Ok(WorkflowTransition::Submit {
            new_status: ApplicationStatus::Submitted,
            first_step: workflow.first().to_string(),
            submitted_at: Utc::now(),
        })
    }

    /// Withdraw an application that is still in the workflow.
    ///
    /// # Returns
    /// * `Ok(WorkflowTransition::Withdraw)` if the transition is valid
    /// * `Err(WorkflowError::InvalidTransition)` from draft or a terminal status
    pub fn withdraw(current_status: ApplicationStatus) -> Result<WorkflowTransition, WorkflowError> {
        if !current_status.can_be_withdrawn() {
            return Err(WorkflowError::InvalidTransition {
                from: current_status,
                action: "withdraw",
            });
        }

        Ok(WorkflowTransition::Withdraw {
            new_status: ApplicationStatus::Withdrawn,
        })
    }

    /// Pause review until the applicant provides more documents.
    ///
    /// The current step is kept so review resumes where it stopped.
    pub fn request_documents(
        current_status: ApplicationStatus,
    ) -> Result<WorkflowTransition, WorkflowError> {
        if !current_status.is_reviewable() {
            return Err(WorkflowError::InvalidTransition {
                from: current_status,
                action: "request documents for",
            });
        }

        Ok(WorkflowTransition::RequestDocuments {
            new_status: ApplicationStatus::PendingDocuments,
        })
    }

    /// Return an application to review after documents were provided.
    pub fn resume_review(
        current_status: ApplicationStatus,
    ) -> Result<WorkflowTransition, WorkflowError> {
        match current_status {
            ApplicationStatus::PendingDocuments => Ok(WorkflowTransition::ResumeReview {
                new_status: ApplicationStatus::UnderReview,
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                action: "resume review of",
            }),
        }
    }

    /// Check that the applicant may still change the application.
    pub fn ensure_editable(current_status: ApplicationStatus) -> Result<(), WorkflowError> {
        if current_status.can_be_edited() {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: current_status,
                action: "edit",
            })
        }
    }

    /// Check that the application may be physically removed.
    pub fn ensure_deletable(current_status: ApplicationStatus) -> Result<(), WorkflowError> {
        if current_status.can_be_deleted() {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: current_status,
                action: "delete",
            })
        }
    }

    /// Check if a status transition is valid.
    ///
    /// `UnderReview → UnderReview` is the partial approval that advances the
    /// current step.
    #[must_use]
    pub fn is_valid_transition(from: ApplicationStatus, to: ApplicationStatus) -> bool {
        use ApplicationStatus::{
            Approved, Draft, PendingDocuments, Rejected, Submitted, UnderReview, Withdrawn,
        };

        matches!(
            (from, to),
            (Draft, Submitted)
                | (
                    Submitted | UnderReview,
                    UnderReview | Approved | Rejected | PendingDocuments | Withdrawn
                )
                | (PendingDocuments, UnderReview | Withdrawn)
        )
    }
}
