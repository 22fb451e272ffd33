//! Property-based tests for ApprovalEngine.
//!
//! Random workflows are walked step by step the way reviewers would walk
//! them, starting from a submitted application.

use proptest::prelude::*;
use scholarflow_shared::UserId;

use crate::workflow::approval::ApprovalEngine;
use crate::workflow::service::WorkflowService;
use crate::workflow::steps::ApprovalWorkflow;
use crate::workflow::types::{ApplicationStatus, ApprovalHistory, WorkflowTransition};

/// Strategy for generating workflows of 1 to 6 uniquely named steps.
fn arb_workflow() -> impl Strategy<Value = ApprovalWorkflow> {
    prop::collection::btree_set("[a-z]{3,10}", 1..=6)
        .prop_map(|steps| ApprovalWorkflow::new(steps).unwrap())
}

/// Folds a transition into a (status, step, history) triple.
fn apply(
    transition: WorkflowTransition,
    status: &mut ApplicationStatus,
    step: &mut Option<String>,
    history: &mut ApprovalHistory,
) {
    *status = transition.new_status();
    match transition {
        WorkflowTransition::Submit { first_step, .. } => *step = Some(first_step),
        WorkflowTransition::Advance { entry, next_step, .. } => {
            history.append(entry);
            *step = Some(next_step);
        }
        WorkflowTransition::Approve { entry, .. } | WorkflowTransition::Reject { entry, .. } => {
            history.append(entry);
            *step = None;
        }
        WorkflowTransition::Withdraw { .. } => *step = None,
        WorkflowTransition::RequestDocuments { .. } | WorkflowTransition::ResumeReview { .. } => {}
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approving every step in order visits each step once and ends approved.
    #[test]
    fn prop_full_walk_approves_after_last_step(workflow in arb_workflow()) {
        let mut status = ApplicationStatus::Draft;
        let mut step = None;
        let mut history = ApprovalHistory::new();

        let submit = WorkflowService::submit(status, &workflow).unwrap();
        apply(submit, &mut status, &mut step, &mut history);

        for (index, expected) in workflow.steps().iter().enumerate() {
            prop_assert_eq!(step.as_deref(), Some(expected.as_str()));
            prop_assert_ne!(status, ApplicationStatus::Approved);

            let transition =
                ApprovalEngine::approve(status, step.as_deref(), &workflow, UserId::new(), None)
                    .unwrap();
            prop_assert_eq!(
                transition.is_final_approval(),
                index + 1 == workflow.step_count()
            );
            apply(transition, &mut status, &mut step, &mut history);
        }

        prop_assert_eq!(status, ApplicationStatus::Approved);
        prop_assert_eq!(step, None);
        prop_assert_eq!(history.len(), workflow.step_count());
        let visited: Vec<_> = history.entries().iter().map(|e| e.step.clone()).collect();
        prop_assert_eq!(visited, workflow.steps().to_vec());
    }

    /// A rejection at any position ends the workflow immediately.
    #[test]
    fn prop_reject_anywhere_is_final(
        workflow in arb_workflow(),
        position in any::<prop::sample::Index>(),
    ) {
        let reject_at = position.index(workflow.step_count());
        let mut status = ApplicationStatus::Draft;
        let mut step = None;
        let mut history = ApprovalHistory::new();

        let submit = WorkflowService::submit(status, &workflow).unwrap();
        apply(submit, &mut status, &mut step, &mut history);

        for _ in 0..reject_at {
            let transition =
                ApprovalEngine::approve(status, step.as_deref(), &workflow, UserId::new(), None)
                    .unwrap();
            apply(transition, &mut status, &mut step, &mut history);
        }

        let rejection = ApprovalEngine::reject(
            status,
            step.as_deref(),
            UserId::new(),
            "budget exhausted".to_string(),
        )
        .unwrap();
        apply(rejection, &mut status, &mut step, &mut history);

        prop_assert_eq!(status, ApplicationStatus::Rejected);
        prop_assert_eq!(step, None);
        prop_assert_eq!(history.len(), reject_at + 1);
        prop_assert!(
            ApprovalEngine::approve(status, None, &workflow, UserId::new(), None).is_err()
        );
    }
}
