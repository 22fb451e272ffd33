//! Workflow domain types for application lifecycle management.
//!
//! This module defines the application status, the review actions that
//! end up in the approval history, and the transitions produced by the
//! state machine and the approval engine.

use chrono::{DateTime, Utc};
use scholarflow_shared::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application status in the review workflow.
///
/// The valid transitions are:
/// - Draft → Submitted (submit)
/// - Submitted / UnderReview → UnderReview (partial approval)
/// - Submitted / UnderReview → Approved (approval of the last step)
/// - Submitted / UnderReview → Rejected (reject, at any step)
/// - Submitted / UnderReview → PendingDocuments (documents requested)
/// - PendingDocuments → UnderReview (documents provided)
/// - Submitted / UnderReview / PendingDocuments → Withdrawn (withdraw)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Created by the student, not yet submitted. The only deletable state.
    Draft,
    /// Submitted and waiting for the first workflow step.
    Submitted,
    /// At least one step approved, waiting for the next one.
    UnderReview,
    /// A reviewer asked for additional documents.
    PendingDocuments,
    /// Every workflow step approved (terminal).
    Approved,
    /// Rejected at some step (terminal).
    Rejected,
    /// Withdrawn by the student (terminal).
    Withdrawn,
}

impl ApplicationStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Draft,
        Self::Submitted,
        Self::UnderReview,
        Self::PendingDocuments,
        Self::Approved,
        Self::Rejected,
        Self::Withdrawn,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::PendingDocuments => "pending_documents",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "under_review" => Some(Self::UnderReview),
            "pending_documents" => Some(Self::PendingDocuments),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "withdrawn" => Some(Self::Withdrawn),
            _ => None,
        }
    }

    /// Returns true if the applicant may still change the application.
    #[must_use]
    pub fn can_be_edited(&self) -> bool {
        matches!(self, Self::Draft | Self::PendingDocuments)
    }

    /// Returns true if the application can be submitted.
    #[must_use]
    pub fn can_be_submitted(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the applicant can withdraw the application.
    #[must_use]
    pub fn can_be_withdrawn(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::UnderReview | Self::PendingDocuments
        )
    }

    /// Returns true if the application can be physically removed.
    #[must_use]
    pub fn can_be_deleted(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if a reviewer can act on the current step.
    #[must_use]
    pub fn is_reviewable(&self) -> bool {
        matches!(self, Self::Submitted | Self::UnderReview)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Withdrawn)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision recorded for a single review.
///
/// `Returned` is kept for compatibility with stored records; no workflow
/// transition produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    /// The step approved the application.
    Approved,
    /// The step rejected the application.
    Rejected,
    /// Sent back to an earlier step (not implemented by the workflow).
    Returned,
}

impl ApprovalAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Returned => "returned",
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One review decision as it appears in the application's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The step that was current when the decision was made.
    pub step: String,
    /// The reviewer who made the decision.
    pub reviewer_id: UserId,
    /// The decision.
    pub action: ApprovalAction,
    /// Reviewer comments (the reason, for rejections).
    pub comments: Option<String>,
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
}

/// Append-only, chronologically ordered record of review decisions.
///
/// Entries can only be added at the end; there is no way to edit, remove
/// or reorder them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalHistory(Vec<HistoryEntry>);

impl ApprovalHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decision at the end of the history.
    pub fn append(&mut self, entry: HistoryEntry) {
        self.0.push(entry);
    }

    /// Returns the recorded decisions, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    /// Returns the most recent decision.
    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }

    /// Returns the number of recorded decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no decision has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Workflow transition with the data needed to apply it.
///
/// Produced by [`WorkflowService`](crate::workflow::WorkflowService) and
/// [`ApprovalEngine`](crate::workflow::ApprovalEngine); applied to an
/// application with `Application::apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowTransition {
    /// Submit a draft application.
    Submit {
        /// The new status after submission.
        new_status: ApplicationStatus,
        /// The first step of the scholarship's workflow.
        first_step: String,
        /// When the application was submitted.
        submitted_at: DateTime<Utc>,
    },
    /// Approve a step that is not the last one.
    Advance {
        /// The new status (under review).
        new_status: ApplicationStatus,
        /// The decision to append to the history.
        entry: HistoryEntry,
        /// The step that becomes current.
        next_step: String,
    },
    /// Approve the last step.
    Approve {
        /// The new status (approved).
        new_status: ApplicationStatus,
        /// The decision to append to the history.
        entry: HistoryEntry,
        /// When the final decision was made.
        decided_at: DateTime<Utc>,
    },
    /// Reject at the current step.
    Reject {
        /// The new status (rejected).
        new_status: ApplicationStatus,
        /// The decision to append to the history.
        entry: HistoryEntry,
        /// The reason given by the reviewer.
        rejection_reason: String,
        /// When the final decision was made.
        decided_at: DateTime<Utc>,
    },
    /// Withdraw an application that is still in the workflow.
    Withdraw {
        /// The new status (withdrawn).
        new_status: ApplicationStatus,
    },
    /// Pause review until the applicant provides more documents.
    RequestDocuments {
        /// The new status (pending documents).
        new_status: ApplicationStatus,
    },
    /// Return to review after documents were provided.
    ResumeReview {
        /// The new status (under review).
        new_status: ApplicationStatus,
    },
}

impl WorkflowTransition {
    /// Returns the new status resulting from this transition.
    #[must_use]
    pub fn new_status(&self) -> ApplicationStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Advance { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::Withdraw { new_status }
            | Self::RequestDocuments { new_status }
            | Self::ResumeReview { new_status } => *new_status,
        }
    }

    /// Returns the review decision carried by this transition, if any.
    #[must_use]
    pub fn history_entry(&self) -> Option<&HistoryEntry> {
        match self {
            Self::Advance { entry, .. } | Self::Approve { entry, .. } | Self::Reject { entry, .. } => {
                Some(entry)
            }
            _ => None,
        }
    }

    /// Returns true if this transition grants the scholarship.
    #[must_use]
    pub fn is_final_approval(&self) -> bool {
        matches!(self, Self::Approve { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn entry(step: &str) -> HistoryEntry {
        HistoryEntry {
            step: step.to_string(),
            reviewer_id: UserId::new(),
            action: ApprovalAction::Approved,
            comments: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ApplicationStatus::ALL {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            ApplicationStatus::parse("UNDER_REVIEW"),
            Some(ApplicationStatus::UnderReview)
        );
        assert_eq!(ApplicationStatus::parse("pending"), None);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ApplicationStatus::PendingDocuments).unwrap();
        assert_eq!(json, "\"pending_documents\"");
    }

    #[rstest]
    #[case(ApplicationStatus::Draft, true, true, false, true)]
    #[case(ApplicationStatus::Submitted, false, false, true, false)]
    #[case(ApplicationStatus::UnderReview, false, false, true, false)]
    #[case(ApplicationStatus::PendingDocuments, true, false, true, false)]
    #[case(ApplicationStatus::Approved, false, false, false, false)]
    #[case(ApplicationStatus::Rejected, false, false, false, false)]
    #[case(ApplicationStatus::Withdrawn, false, false, false, false)]
    fn test_status_guards(
        #[case] status: ApplicationStatus,
        #[case] editable: bool,
        #[case] submittable: bool,
        #[case] withdrawable: bool,
        #[case] deletable: bool,
    ) {
        assert_eq!(status.can_be_edited(), editable);
        assert_eq!(status.can_be_submitted(), submittable);
        assert_eq!(status.can_be_withdrawn(), withdrawable);
        assert_eq!(status.can_be_deleted(), deletable);
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = ApplicationStatus::ALL
            .into_iter()
            .filter(ApplicationStatus::is_terminal)
            .collect();
        assert_eq!(
            terminal,
            vec![
                ApplicationStatus::Approved,
                ApplicationStatus::Rejected,
                ApplicationStatus::Withdrawn
            ]
        );
    }

    #[test]
    fn test_history_appends_in_order() {
        let mut history = ApprovalHistory::new();
        assert!(history.is_empty());

        history.append(entry("coordinator"));
        history.append(entry("committee"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].step, "coordinator");
        assert_eq!(history.last().map(|e| e.step.as_str()), Some("committee"));
    }

    #[test]
    fn test_history_serializes_as_plain_array() {
        let mut history = ApprovalHistory::new();
        history.append(entry("coordinator"));
        let value = serde_json::to_value(&history).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["action"], "approved");
    }

    #[test]
    fn test_transition_exposes_entry() {
        let transition = WorkflowTransition::Advance {
            new_status: ApplicationStatus::UnderReview,
            entry: entry("coordinator"),
            next_step: "committee".to_string(),
        };
        assert_eq!(transition.new_status(), ApplicationStatus::UnderReview);
        assert!(transition.history_entry().is_some());
        assert!(!transition.is_final_approval());

        let withdraw = WorkflowTransition::Withdraw {
            new_status: ApplicationStatus::Withdrawn,
        };
        assert!(withdraw.history_entry().is_none());
    }
}
