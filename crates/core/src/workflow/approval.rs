//! Approval workflow engine.
//!
//! This module walks an application through the ordered steps of its
//! scholarship's workflow and checks that the reviewer holds the current
//! step. Which role holds which step comes from an explicit mapping
//! ([`StepAuthority`]) rather than from matching role and step names.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use scholarflow_shared::{UserId, WorkflowConfig};
use serde::{Deserialize, Serialize};

use crate::workflow::error::WorkflowError;
use crate::workflow::steps::ApprovalWorkflow;
use crate::workflow::types::{ApplicationStatus, ApprovalAction, HistoryEntry, WorkflowTransition};

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Applies for scholarships.
    Student,
    /// First-line review of applications.
    Coordinator,
    /// Selection committee member.
    Committee,
    /// Finance office, confirms funding.
    Finance,
    /// Full access; may act on any step when the override is enabled.
    Admin,
}

impl UserRole {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "student" => Some(Self::Student),
            "coordinator" => Some(Self::Coordinator),
            "committee" => Some(Self::Committee),
            "finance" => Some(Self::Finance),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Coordinator => "coordinator",
            Self::Committee => "committee",
            Self::Finance => "finance",
            Self::Admin => "admin",
        }
    }

    /// Returns true for staff roles that may read any application.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        !matches!(self, Self::Student)
    }
}

/// Mapping from workflow step to the role that reviews it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepAuthority {
    roles: BTreeMap<String, UserRole>,
    admin_override: bool,
}

impl StepAuthority {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new(admin_override: bool) -> Self {
        Self {
            roles: BTreeMap::new(),
            admin_override,
        }
    }

    /// Assigns a step to a role.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>, role: UserRole) -> Self {
        self.roles.insert(step.into(), role);
        self
    }

    /// Builds the mapping from configuration.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRole` if a configured role name is not recognised.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        config
            .step_roles
            .iter()
            .try_fold(
                Self::new(config.admin_override),
                |authority, (step, role)| -> Result<Self, WorkflowError> {
                    let role = UserRole::parse(role)
                        .ok_or_else(|| WorkflowError::UnknownRole(role.clone()))?;
                    Ok(authority.with_step(step.clone(), role))
                },
            )
    }

    /// Returns the role that reviews a step.
    #[must_use]
    pub fn required_role(&self, step: &str) -> Option<UserRole> {
        self.roles.get(step).copied()
    }

    /// Check that `role` may act on `current_step`.
    ///
    /// # Returns
    /// * `Ok(())` if the role holds the step, or is admin with the override on
    /// * `Err(WorkflowError::OutOfTurn)` if the role holds another step of this workflow
    /// * `Err(WorkflowError::NotAuthorizedForStep)` if the role holds no step of it
    /// * `Err(WorkflowError::UnmappedStep)` if no role holds the step
    pub fn authorize(
        &self,
        workflow: &ApprovalWorkflow,
        current_step: &str,
        role: UserRole,
    ) -> Result<(), WorkflowError> {
        if role == UserRole::Admin && self.admin_override {
            return Ok(());
        }

        let required = self
            .required_role(current_step)
            .ok_or_else(|| WorkflowError::UnmappedStep(current_step.to_string()))?;
        if required == role {
            return Ok(());
        }

        let held_step = workflow
            .steps()
            .iter()
            .find(|step| self.required_role(step) == Some(role));

        match held_step {
            Some(held_step) => Err(WorkflowError::OutOfTurn {
                role: role.as_str().to_string(),
                held_step: held_step.clone(),
                current_step: current_step.to_string(),
            }),
            None => Err(WorkflowError::NotAuthorizedForStep {
                role: role.as_str().to_string(),
                step: current_step.to_string(),
            }),
        }
    }
}

impl Default for StepAuthority {
    fn default() -> Self {
        Self::new(true)
            .with_step("coordinator", UserRole::Coordinator)
            .with_step("committee", UserRole::Committee)
            .with_step("finance", UserRole::Finance)
    }
}

/// Stateless engine for review decisions.
pub struct ApprovalEngine;

impl ApprovalEngine {
    /// Approve the current step.
    ///
    /// Appends an `approved` entry and either advances to the next step
    /// (status becomes `UnderReview`) or, when the current step is the last
    /// one, grants the application.
    ///
    /// # Errors
    /// * `InvalidTransition` if the application is not in review
    /// * `NoCurrentStep` if no step is current
    /// * `UnknownStep` if the current step is not part of the workflow
    pub fn approve(
        current_status: ApplicationStatus,
        current_step: Option<&str>,
        workflow: &ApprovalWorkflow,
        reviewer_id: UserId,
        comments: Option<String>,
    ) -> Result<WorkflowTransition, WorkflowError> {
        let step = Self::reviewable_step(current_status, current_step, "approve")?;
        let next = workflow.next_after(step)?;
        let now = Utc::now();

        let entry = HistoryEntry {
            step: step.to_string(),
            reviewer_id,
            action: ApprovalAction::Approved,
            comments,
            timestamp: now,
        };

        Ok(match next {
            Some(next_step) => WorkflowTransition::Advance {
                new_status: ApplicationStatus::UnderReview,
                entry,
                next_step: next_step.to_string(),
            },
            None => WorkflowTransition::Approve {
                new_status: ApplicationStatus::Approved,
                entry,
                decided_at: now,
            },
        })
    }

    /// Reject at the current step. Rejection is final at any step.
    ///
    /// # Errors
    /// * `RejectionReasonRequired` if the reason is blank
    /// * `InvalidTransition` if the application is not in review
    /// * `NoCurrentStep` if no step is current
    pub fn reject(
        current_status: ApplicationStatus,
        current_step: Option<&str>,
        reviewer_id: UserId,
        rejection_reason: String,
    ) -> Result<WorkflowTransition, WorkflowError> {
        if rejection_reason.trim().is_empty() {
            return Err(WorkflowError::RejectionReasonRequired);
        }

        let step = Self::reviewable_step(current_status, current_step, "reject")?;
        let now = Utc::now();

        Ok(WorkflowTransition::Reject {
            new_status: ApplicationStatus::Rejected,
            entry: HistoryEntry {
                step: step.to_string(),
                reviewer_id,
                action: ApprovalAction::Rejected,
                comments: Some(rejection_reason.clone()),
                timestamp: now,
            },
            rejection_reason,
            decided_at: now,
        })
    }

    /// Returns the step a reviewer would act on.
    ///
    /// # Errors
    /// * `InvalidTransition` if the application is not in review
    /// * `NoCurrentStep` if no step is current
    pub fn reviewable_step<'a>(
        current_status: ApplicationStatus,
        current_step: Option<&'a str>,
        action: &'static str,
    ) -> Result<&'a str, WorkflowError> {
        if !current_status.is_reviewable() {
            return Err(WorkflowError::InvalidTransition {
                from: current_status,
                action,
            });
        }
        current_step.ok_or(WorkflowError::NoCurrentStep)
    }

    /// Check a reviewer score is within 0-100.
    pub fn validate_score(score: Option<Decimal>) -> Result<(), WorkflowError> {
        match score {
            Some(score) if score < Decimal::ZERO || score > Decimal::ONE_HUNDRED => {
                Err(WorkflowError::ScoreOutOfRange(score))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_steps() -> ApprovalWorkflow {
        ApprovalWorkflow::new(["coordinator", "committee"]).unwrap()
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::parse("student"), Some(UserRole::Student));
        assert_eq!(UserRole::parse("COMMITTEE"), Some(UserRole::Committee));
        assert_eq!(UserRole::parse("Finance"), Some(UserRole::Finance));
        assert_eq!(UserRole::parse("dean"), None);
        assert!(!UserRole::Student.is_staff());
        assert!(UserRole::Coordinator.is_staff());
    }

    #[test]
    fn test_approve_first_step_advances() {
        let reviewer = UserId::new();
        let transition = ApprovalEngine::approve(
            ApplicationStatus::Submitted,
            Some("coordinator"),
            &two_steps(),
            reviewer,
            Some("looks good".to_string()),
        )
        .unwrap();

        match transition {
            WorkflowTransition::Advance {
                new_status,
                entry,
                next_step,
            } => {
                assert_eq!(new_status, ApplicationStatus::UnderReview);
                assert_eq!(next_step, "committee");
                assert_eq!(entry.step, "coordinator");
                assert_eq!(entry.reviewer_id, reviewer);
                assert_eq!(entry.action, ApprovalAction::Approved);
            }
            other => panic!("expected advance, got {other:?}"),
        }
    }

    #[test]
    fn test_approve_last_step_grants() {
        let transition = ApprovalEngine::approve(
            ApplicationStatus::UnderReview,
            Some("committee"),
            &two_steps(),
            UserId::new(),
            None,
        )
        .unwrap();
        assert_eq!(transition.new_status(), ApplicationStatus::Approved);
        assert!(transition.is_final_approval());
    }

    #[test]
    fn test_approve_outside_review_fails() {
        for status in [
            ApplicationStatus::Draft,
            ApplicationStatus::PendingDocuments,
            ApplicationStatus::Approved,
            ApplicationStatus::Rejected,
            ApplicationStatus::Withdrawn,
        ] {
            assert!(matches!(
                ApprovalEngine::approve(status, Some("coordinator"), &two_steps(), UserId::new(), None),
                Err(WorkflowError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_approve_unknown_step_fails() {
        let result = ApprovalEngine::approve(
            ApplicationStatus::UnderReview,
            Some("finance"),
            &two_steps(),
            UserId::new(),
            None,
        );
        assert!(matches!(result, Err(WorkflowError::UnknownStep(_))));
    }

    #[test]
    fn test_reject_at_any_step_is_final() {
        for step in ["coordinator", "committee"] {
            let transition = ApprovalEngine::reject(
                ApplicationStatus::UnderReview,
                Some(step),
                UserId::new(),
                "insufficient funds".to_string(),
            )
            .unwrap();
            assert_eq!(transition.new_status(), ApplicationStatus::Rejected);
            let entry = transition.history_entry().unwrap();
            assert_eq!(entry.step, step);
            assert_eq!(entry.comments.as_deref(), Some("insufficient funds"));
        }
    }

    #[test]
    fn test_reject_requires_reason() {
        let result = ApprovalEngine::reject(
            ApplicationStatus::Submitted,
            Some("coordinator"),
            UserId::new(),
            "   ".to_string(),
        );
        assert!(matches!(result, Err(WorkflowError::RejectionReasonRequired)));
    }

    #[test]
    fn test_authorize_matching_role() {
        let authority = StepAuthority::default();
        assert!(authority
            .authorize(&two_steps(), "committee", UserRole::Committee)
            .is_ok());
    }

    #[test]
    fn test_authorize_out_of_turn() {
        let authority = StepAuthority::default();
        let result = authority.authorize(&two_steps(), "coordinator", UserRole::Committee);
        assert!(matches!(
            result,
            Err(WorkflowError::OutOfTurn { held_step, .. }) if held_step == "committee"
        ));
    }

    #[test]
    fn test_authorize_role_outside_workflow() {
        let authority = StepAuthority::default();
        assert!(matches!(
            authority.authorize(&two_steps(), "coordinator", UserRole::Student),
            Err(WorkflowError::NotAuthorizedForStep { .. })
        ));
        // Finance holds a step, but not one in this workflow.
        assert!(matches!(
            authority.authorize(&two_steps(), "coordinator", UserRole::Finance),
            Err(WorkflowError::NotAuthorizedForStep { .. })
        ));
    }

    #[test]
    fn test_admin_override() {
        let workflow = two_steps();
        assert!(StepAuthority::default()
            .authorize(&workflow, "committee", UserRole::Admin)
            .is_ok());
        assert!(StepAuthority::new(false)
            .with_step("committee", UserRole::Committee)
            .authorize(&workflow, "committee", UserRole::Admin)
            .is_err());
    }

    #[test]
    fn test_decoupled_step_names() {
        let workflow = ApprovalWorkflow::new(["dean_review"]).unwrap();
        let authority = StepAuthority::new(false).with_step("dean_review", UserRole::Committee);
        assert!(authority
            .authorize(&workflow, "dean_review", UserRole::Committee)
            .is_ok());
        assert!(matches!(
            StepAuthority::default().authorize(&workflow, "dean_review", UserRole::Committee),
            Err(WorkflowError::UnmappedStep(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let mut config = WorkflowConfig::default();
        config
            .step_roles
            .insert("scholarship_office".to_string(), "finance".to_string());
        let authority = StepAuthority::from_config(&config).unwrap();
        assert_eq!(
            authority.required_role("scholarship_office"),
            Some(UserRole::Finance)
        );

        config
            .step_roles
            .insert("registrar".to_string(), "registrar".to_string());
        assert!(matches!(
            StepAuthority::from_config(&config),
            Err(WorkflowError::UnknownRole(role)) if role == "registrar"
        ));
    }

    #[test]
    fn test_validate_score() {
        assert!(ApprovalEngine::validate_score(None).is_ok());
        assert!(ApprovalEngine::validate_score(Some(Decimal::new(875, 1))).is_ok());
        assert!(ApprovalEngine::validate_score(Some(Decimal::new(101, 0))).is_err());
        assert!(ApprovalEngine::validate_score(Some(Decimal::new(-1, 0))).is_err());
    }
}
