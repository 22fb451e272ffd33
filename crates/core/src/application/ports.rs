//! Collaborator contracts of the lifecycle service.
//!
//! These traits are implemented by the db crate. Repositories are awaited
//! inline; notification and audit sinks are fire-and-forget.

use std::collections::BTreeSet;
use std::future::Future;

use rust_decimal::Decimal;
use scholarflow_shared::{ApplicationId, ScholarshipId, StudentId, UserId};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::application::types::{Application, Approval, Payment};
use crate::eligibility::StudentProfile;
use crate::scholarship::Scholarship;

/// Errors raised by repository adapters.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A uniqueness constraint was violated.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// The stored version differs from the one the caller read.
    #[error("Version conflict on {entity} {id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Entity type.
        entity: &'static str,
        /// Entity id.
        id: String,
        /// Version the caller read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// The entity to update or delete does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity type.
        entity: &'static str,
        /// Entity id.
        id: String,
    },

    /// The scholarship has no recipient slot left.
    #[error("Scholarship {0} has no recipient slots left")]
    CapacityExhausted(ScholarshipId),

    /// The backing store failed.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by notification, audit and payment collaborators.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The side effect could not be delivered.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Notification type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The application entered the workflow.
    ApplicationSubmitted,
    /// A step approved and the application moved on.
    ApplicationAdvanced,
    /// The scholarship was granted.
    ApplicationApproved,
    /// The application was rejected.
    ApplicationRejected,
    /// The applicant withdrew the application.
    ApplicationWithdrawn,
    /// A reviewer asked for more documents.
    DocumentsRequested,
}

/// Message addressed to a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Recipient.
    pub recipient: UserId,
    /// Notification type.
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Structured payload.
    pub data: Value,
}

/// One audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    /// Who acted.
    pub actor_id: UserId,
    /// What was done.
    pub action: String,
    /// Resource type, e.g. `application`.
    pub resource_type: String,
    /// Resource id.
    pub resource_id: String,
    /// State before the change.
    pub old_values: Option<Value>,
    /// State after the change.
    pub new_values: Option<Value>,
}

/// Read access to student profiles.
pub trait StudentRepository: Send + Sync {
    /// Find a student by id.
    fn find_student(
        &self,
        id: StudentId,
    ) -> impl Future<Output = Result<Option<StudentProfile>, RepositoryError>> + Send;

    /// Find the student profile owned by a user.
    fn find_student_by_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<StudentProfile>, RepositoryError>> + Send;
}

/// Scholarship access, including recipient slot accounting.
pub trait ScholarshipRepository: Send + Sync {
    /// Find a scholarship by id.
    fn find_scholarship(
        &self,
        id: ScholarshipId,
    ) -> impl Future<Output = Result<Option<Scholarship>, RepositoryError>> + Send;

    /// Atomically take one recipient slot.
    ///
    /// Fails with `CapacityExhausted` when `current_recipients` has reached
    /// `max_recipients`.
    fn reserve_recipient_slot(
        &self,
        id: ScholarshipId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Give back a slot taken by [`reserve_recipient_slot`](Self::reserve_recipient_slot).
    fn release_recipient_slot(
        &self,
        id: ScholarshipId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Application and approval persistence.
pub trait ApplicationRepository: Send + Sync {
    /// Find an application by id.
    fn find_application(
        &self,
        id: ApplicationId,
    ) -> impl Future<Output = Result<Option<Application>, RepositoryError>> + Send;

    /// Find the application of a student for a scholarship.
    fn find_application_for(
        &self,
        student_id: StudentId,
        scholarship_id: ScholarshipId,
    ) -> impl Future<Output = Result<Option<Application>, RepositoryError>> + Send;

    /// Insert a new application.
    ///
    /// Fails with `DuplicateKey` if the student already applied for the
    /// scholarship.
    fn create_application(
        &self,
        application: Application,
    ) -> impl Future<Output = Result<Application, RepositoryError>> + Send;

    /// Replace an application if its version is unchanged.
    fn update_application(
        &self,
        application: Application,
    ) -> impl Future<Output = Result<Application, RepositoryError>> + Send;

    /// Commit a reviewed application together with its approval record.
    fn record_review(
        &self,
        application: Application,
        approval: Approval,
    ) -> impl Future<Output = Result<Application, RepositoryError>> + Send;

    /// Physically remove a draft application.
    ///
    /// The row is removed only while its stored version equals
    /// `expected_version` and it is still a draft; otherwise the call fails
    /// with `VersionConflict`.
    fn delete_application(
        &self,
        id: ApplicationId,
        expected_version: u64,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// List approval records of an application, oldest first.
    fn approvals_for(
        &self,
        application_id: ApplicationId,
    ) -> impl Future<Output = Result<Vec<Approval>, RepositoryError>> + Send;
}

/// Every repository the lifecycle service needs, behind one handle.
pub trait Store: StudentRepository + ScholarshipRepository + ApplicationRepository {}

impl<T> Store for T where T: StudentRepository + ScholarshipRepository + ApplicationRepository {}

/// Document types required and uploaded.
pub trait DocumentChecker: Send + Sync {
    /// Document types a scholarship requires.
    fn required_types(
        &self,
        scholarship_id: ScholarshipId,
    ) -> impl Future<Output = Result<BTreeSet<String>, RepositoryError>> + Send;

    /// Document types uploaded for an application.
    fn uploaded_types(
        &self,
        application_id: ApplicationId,
    ) -> impl Future<Output = Result<BTreeSet<String>, RepositoryError>> + Send;
}

/// Delivers notifications.
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification.
    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Records audit entries.
pub trait AuditSink: Send + Sync {
    /// Record one entry.
    fn record(&self, entry: AuditEntry) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Creates payment records.
pub trait PaymentFactory: Send + Sync {
    /// Create a pending payment for an approved application.
    fn create_pending(
        &self,
        application_id: ApplicationId,
        amount: Decimal,
    ) -> impl Future<Output = Result<Payment, SinkError>> + Send;
}
