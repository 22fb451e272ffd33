//! Property-based tests for WorkflowService.
//!
//! These tests check terminality and the delete guard over every status.

use proptest::prelude::*;

use crate::workflow::approval::ApprovalEngine;
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::steps::ApprovalWorkflow;
use crate::workflow::types::ApplicationStatus;
use scholarflow_shared::UserId;

/// Strategy for generating random ApplicationStatus values.
fn arb_status() -> impl Strategy<Value = ApplicationStatus> {
    prop::sample::select(ApplicationStatus::ALL.to_vec())
}

/// Strategy for generating terminal statuses.
fn arb_terminal_status() -> impl Strategy<Value = ApplicationStatus> {
    prop_oneof![
        Just(ApplicationStatus::Approved),
        Just(ApplicationStatus::Rejected),
        Just(ApplicationStatus::Withdrawn),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// No command succeeds once an application is terminal.
    #[test]
    fn prop_terminal_statuses_accept_nothing(status in arb_terminal_status()) {
        let workflow = ApprovalWorkflow::default();
        prop_assert!(WorkflowService::submit(status, &workflow).is_err());
        prop_assert!(WorkflowService::withdraw(status).is_err());
        prop_assert!(WorkflowService::request_documents(status).is_err());
        prop_assert!(WorkflowService::resume_review(status).is_err());
        prop_assert!(WorkflowService::ensure_deletable(status).is_err());
        prop_assert!(
            ApprovalEngine::approve(status, Some("coordinator"), &workflow, UserId::new(), None)
                .is_err()
        );
        prop_assert!(
            ApprovalEngine::reject(status, Some("coordinator"), UserId::new(), "late".to_string())
                .is_err()
        );
    }

    /// Delete succeeds from draft only; every other status is an invalid transition.
    #[test]
    fn prop_only_draft_deletes(status in arb_status()) {
        let result = WorkflowService::ensure_deletable(status);
        if status == ApplicationStatus::Draft {
            prop_assert!(result.is_ok());
        } else {
            let is_invalid_transition = matches!(result, Err(WorkflowError::InvalidTransition { .. }));
            prop_assert!(is_invalid_transition);
        }
    }

    /// Every successful transition is one the transition table allows.
    #[test]
    fn prop_transitions_agree_with_table(status in arb_status()) {
        let workflow = ApprovalWorkflow::default();
        let candidates = [
            WorkflowService::submit(status, &workflow),
            WorkflowService::withdraw(status),
            WorkflowService::request_documents(status),
            WorkflowService::resume_review(status),
            ApprovalEngine::approve(status, Some("coordinator"), &workflow, UserId::new(), None),
            ApprovalEngine::reject(status, Some("coordinator"), UserId::new(), "no".to_string()),
        ];
        for transition in candidates.into_iter().flatten() {
            prop_assert!(WorkflowService::is_valid_transition(status, transition.new_status()));
        }
    }
}
