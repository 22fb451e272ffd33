//! Application, approval record and payment types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use scholarflow_shared::{ApplicationId, ApprovalId, PaymentId, ScholarshipId, StudentId, UserId};
use serde::{Deserialize, Serialize};

use crate::eligibility::StudentProfile;
use crate::workflow::{
    ApplicationStatus, ApprovalAction, ApprovalHistory, HistoryEntry, UserRole, WorkflowError,
    WorkflowService, WorkflowTransition,
};

/// The authenticated user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The acting user.
    pub user_id: UserId,
    /// The user's role.
    pub role: UserRole,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// Returns true if the actor is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// A student's application for one scholarship.
///
/// Status, current step, history and decision timestamps are private:
/// they change only through [`Application::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Unique identifier.
    pub id: ApplicationId,
    /// The applying student.
    pub student_id: StudentId,
    /// The scholarship applied for.
    pub scholarship_id: ScholarshipId,
    /// The user that owns the student profile.
    pub applicant_id: UserId,
    /// Free-text statement by the applicant.
    pub personal_statement: String,
    /// Position among the scholarship's applicants, set by reviewers.
    pub ranking: Option<u32>,
    /// When the application was created.
    pub created_at: DateTime<Utc>,
    /// When the application last changed.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, maintained by the repository.
    pub version: u64,
    status: ApplicationStatus,
    current_approval_step: Option<String>,
    approval_history: ApprovalHistory,
    score: Option<Decimal>,
    rejection_reason: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    reviewed_at: Option<DateTime<Utc>>,
    decision_date: Option<DateTime<Utc>>,
}

impl Application {
    /// Creates a draft application for a student.
    #[must_use]
    pub fn draft(
        student: &StudentProfile,
        scholarship_id: ScholarshipId,
        personal_statement: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ApplicationId::new(),
            student_id: student.id,
            scholarship_id,
            applicant_id: student.user_id,
            personal_statement: personal_statement.into(),
            ranking: None,
            created_at: now,
            updated_at: now,
            version: 0,
            status: ApplicationStatus::Draft,
            current_approval_step: None,
            approval_history: ApprovalHistory::new(),
            score: None,
            rejection_reason: None,
            submitted_at: None,
            reviewed_at: None,
            decision_date: None,
        }
    }

    /// Applies a validated transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the transition's target status is not
    /// reachable from the current status.
    pub fn apply(&mut self, transition: &WorkflowTransition) -> Result<(), WorkflowError> {
        let to = transition.new_status();
        if !WorkflowService::is_valid_transition(self.status, to) {
            return Err(WorkflowError::InvalidTransition {
                from: self.status,
                action: "move",
            });
        }

        match transition {
            WorkflowTransition::Submit {
                first_step,
                submitted_at,
                ..
            } => {
                self.current_approval_step = Some(first_step.clone());
                self.submitted_at = self.submitted_at.or(Some(*submitted_at));
            }
            WorkflowTransition::Advance {
                entry, next_step, ..
            } => {
                self.record_decision(entry);
                self.current_approval_step = Some(next_step.clone());
            }
            WorkflowTransition::Approve {
                entry, decided_at, ..
            } => {
                self.record_decision(entry);
                self.current_approval_step = None;
                self.decision_date = self.decision_date.or(Some(*decided_at));
            }
            WorkflowTransition::Reject {
                entry,
                rejection_reason,
                decided_at,
                ..
            } => {
                self.record_decision(entry);
                self.current_approval_step = None;
                self.rejection_reason = Some(rejection_reason.clone());
                self.decision_date = self.decision_date.or(Some(*decided_at));
            }
            WorkflowTransition::Withdraw { .. } => {
                self.current_approval_step = None;
            }
            WorkflowTransition::RequestDocuments { .. }
            | WorkflowTransition::ResumeReview { .. } => {}
        }

        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn record_decision(&mut self, entry: &HistoryEntry) {
        self.reviewed_at = self.reviewed_at.or(Some(entry.timestamp));
        self.approval_history.append(entry.clone());
    }

    /// Sets the score from the latest scored review.
    pub fn record_score(&mut self, score: Option<Decimal>) {
        if score.is_some() {
            self.score = score;
        }
    }

    /// Sets the ranking from the latest review that placed the application.
    pub fn record_ranking(&mut self, ranking: Option<u32>) {
        if ranking.is_some() {
            self.ranking = ranking;
        }
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    /// Returns the step awaiting review, if any.
    #[must_use]
    pub fn current_approval_step(&self) -> Option<&str> {
        self.current_approval_step.as_deref()
    }

    /// Returns the review decisions, oldest first.
    #[must_use]
    pub fn approval_history(&self) -> &ApprovalHistory {
        &self.approval_history
    }

    /// Returns the latest reviewer score.
    #[must_use]
    pub fn score(&self) -> Option<Decimal> {
        self.score
    }

    /// Returns the rejection reason.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Returns when the application was submitted.
    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Returns when the first review decision was made.
    #[must_use]
    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    /// Returns when the final decision was made.
    #[must_use]
    pub fn decision_date(&self) -> Option<DateTime<Utc>> {
        self.decision_date
    }

    /// Returns true if the user owns this application.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.applicant_id == user_id
    }
}

/// Immutable record of one review decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Unique identifier.
    pub id: ApprovalId,
    /// The reviewed application.
    pub application_id: ApplicationId,
    /// The step that was current at the time of the review.
    pub approval_step: String,
    /// The reviewer.
    pub reviewed_by: UserId,
    /// The decision.
    pub action: ApprovalAction,
    /// Overall score, 0-100.
    pub score: Option<Decimal>,
    /// Reviewer comments.
    pub comments: Option<String>,
    /// Free-form weighted score breakdown.
    pub criteria_scores: BTreeMap<String, Decimal>,
    /// When the review was made.
    pub reviewed_at: DateTime<Utc>,
}

impl Approval {
    /// Builds the record for a history entry.
    #[must_use]
    pub fn from_entry(
        application_id: ApplicationId,
        entry: &HistoryEntry,
        score: Option<Decimal>,
        criteria_scores: BTreeMap<String, Decimal>,
    ) -> Self {
        Self {
            id: ApprovalId::new(),
            application_id,
            approval_step: entry.step.clone(),
            reviewed_by: entry.reviewer_id,
            action: entry.action,
            score,
            comments: entry.comments.clone(),
            criteria_scores,
            reviewed_at: entry.timestamp,
        }
    }
}

/// Payment status. Only creation is handled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting disbursement.
    Pending,
}

/// Disbursement owed to an approved applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier.
    pub id: PaymentId,
    /// The approved application.
    pub application_id: ApplicationId,
    /// The scholarship amount.
    pub amount: Decimal,
    /// Payment status.
    pub status: PaymentStatus,
    /// When the payment was created.
    pub created_at: DateTime<Utc>,
}

/// Input for creating an application.
#[derive(Debug, Clone, Deserialize)]
pub struct NewApplication {
    /// The scholarship to apply for.
    pub scholarship_id: ScholarshipId,
    /// Free-text statement by the applicant.
    #[serde(default)]
    pub personal_statement: String,
}

/// A reviewer's decision on the current step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Approve the current step.
    Approve,
    /// Reject the application.
    Reject {
        /// Why the application is rejected.
        reason: String,
    },
}

/// Input for reviewing an application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewRequest {
    /// The decision.
    #[serde(flatten)]
    pub decision: ReviewDecision,
    /// Reviewer comments, stored with approvals.
    #[serde(default)]
    pub comments: Option<String>,
    /// Overall score, 0-100.
    #[serde(default)]
    pub score: Option<Decimal>,
    /// Weighted score breakdown.
    #[serde(default)]
    pub criteria_scores: BTreeMap<String, Decimal>,
    /// Position among the scholarship's applicants.
    #[serde(default)]
    pub ranking: Option<u32>,
}

impl ReviewRequest {
    /// An approval with optional comments.
    #[must_use]
    pub fn approve(comments: Option<String>) -> Self {
        Self {
            decision: ReviewDecision::Approve,
            comments,
            score: None,
            criteria_scores: BTreeMap::new(),
            ranking: None,
        }
    }

    /// A rejection with a reason.
    #[must_use]
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            decision: ReviewDecision::Reject {
                reason: reason.into(),
            },
            comments: None,
            score: None,
            criteria_scores: BTreeMap::new(),
            ranking: None,
        }
    }

    /// Attaches a score.
    #[must_use]
    pub fn with_score(mut self, score: Decimal) -> Self {
        self.score = Some(score);
        self
    }

    /// Places the application among its competitors.
    #[must_use]
    pub fn with_ranking(mut self, ranking: u32) -> Self {
        self.ranking = Some(ranking);
        self
    }

    /// Attaches one criterion score.
    #[must_use]
    pub fn with_criterion(mut self, name: impl Into<String>, score: Decimal) -> Self {
        self.criteria_scores.insert(name.into(), score);
        self
    }
}

/// Result of a committed review.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// The application after the review.
    pub application: Application,
    /// The recorded decision.
    pub approval: Approval,
    /// The payment, when the review granted the scholarship.
    pub payment: Option<Payment>,
}
