//! Application lifecycle service.
//!
//! The façade used by request handlers. It checks ownership, role
//! authority and preconditions, asks the workflow for the transition,
//! commits it, and only then emits side effects.

use std::sync::Arc;

use chrono::Utc;
use scholarflow_shared::{AppConfig, ApplicationId, ScholarshipId};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::application::dispatch::SideEffectDispatcher;
use crate::application::error::LifecycleError;
use crate::application::ports::{
    AuditEntry, AuditSink, DocumentChecker, Notification, NotificationKind, NotificationSink,
    PaymentFactory, Store,
};
use crate::application::types::{
    Actor, Application, Approval, NewApplication, Payment, ReviewDecision, ReviewOutcome,
    ReviewRequest,
};
use crate::eligibility::EligibilityEvaluator;
use crate::scholarship::{Scholarship, ScholarshipStatus};
use crate::workflow::{
    ApplicationStatus, ApprovalEngine, ApprovalWorkflow, StepAuthority, WorkflowError,
    WorkflowService, WorkflowTransition,
};

/// Application lifecycle service.
pub struct ApplicationService<S, D, N, A, P> {
    store: Arc<S>,
    documents: Arc<D>,
    payments: Arc<P>,
    side_effects: SideEffectDispatcher<N, A>,
    authority: StepAuthority,
    default_workflow: ApprovalWorkflow,
}

impl<S, D, N, A, P> ApplicationService<S, D, N, A, P>
where
    S: Store,
    D: DocumentChecker,
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
    P: PaymentFactory,
{
    /// Creates the service from its collaborators and configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured workflow or step roles are invalid.
    pub fn new(
        store: Arc<S>,
        documents: Arc<D>,
        notifications: Arc<N>,
        audit: Arc<A>,
        payments: Arc<P>,
        config: &AppConfig,
    ) -> Result<Self, WorkflowError> {
        Ok(Self {
            store,
            documents,
            payments,
            side_effects: SideEffectDispatcher::new(
                notifications,
                audit,
                config.side_effects.enabled,
            ),
            authority: StepAuthority::from_config(&config.workflow)?,
            default_workflow: ApprovalWorkflow::from_config(&config.workflow)?,
        })
    }

    /// Create a draft application for the acting student.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor has no student profile
    /// - `NotFound` if the scholarship does not exist
    /// - `ScholarshipNotOpen`, `DeadlinePassed`, `NoRecipientSlots` if the
    ///   scholarship does not accept applications
    /// - `DuplicateApplication` if the student already applied
    /// - `Ineligible` if the student does not meet the requirements
    pub async fn create(
        &self,
        actor: &Actor,
        input: NewApplication,
    ) -> Result<Application, LifecycleError> {
        let student = self
            .store
            .find_student_by_user(actor.user_id)
            .await?
            .ok_or_else(|| {
                LifecycleError::Forbidden("only students with a profile can apply".to_string())
            })?;

        let scholarship = self.load_scholarship(input.scholarship_id).await?;
        if scholarship.status != ScholarshipStatus::Active {
            return Err(LifecycleError::ScholarshipNotOpen);
        }
        if !scholarship.is_open_at(Utc::now()) {
            return Err(LifecycleError::DeadlinePassed);
        }
        if !scholarship.has_open_slot() {
            return Err(LifecycleError::NoRecipientSlots);
        }

        if self
            .store
            .find_application_for(student.id, scholarship.id)
            .await?
            .is_some()
        {
            debug!(student_id = %student.id, scholarship_id = %scholarship.id, "duplicate application refused");
            return Err(LifecycleError::DuplicateApplication);
        }

        let report = EligibilityEvaluator::assess(&student, &scholarship);
        if !report.is_eligible() {
            debug!(student_id = %student.id, scholarship_id = %scholarship.id, "student not eligible");
            return Err(LifecycleError::Ineligible {
                reasons: report.failure_reasons(),
            });
        }

        let application = self
            .store
            .create_application(Application::draft(
                &student,
                scholarship.id,
                input.personal_statement,
            ))
            .await?;

        info!(
            application_id = %application.id,
            student_id = %student.id,
            scholarship_id = %scholarship.id,
            "application created"
        );
        self.audit(actor, "create", &application, None);

        Ok(application)
    }

    /// Fetch an application. Owners and staff may read it.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Forbidden`.
    pub async fn get(&self, actor: &Actor, id: ApplicationId) -> Result<Application, LifecycleError> {
        let application = self.load(id).await?;
        Self::ensure_can_read(actor, &application)?;
        Ok(application)
    }

    /// List the review decisions recorded for an application.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Forbidden`.
    pub async fn approvals(
        &self,
        actor: &Actor,
        id: ApplicationId,
    ) -> Result<Vec<Approval>, LifecycleError> {
        let application = self.load(id).await?;
        Self::ensure_can_read(actor, &application)?;
        Ok(self.store.approvals_for(id).await?)
    }

    /// Replace the personal statement of an editable application.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or `InvalidTransition` outside draft and
    /// pending documents.
    pub async fn update_draft(
        &self,
        actor: &Actor,
        id: ApplicationId,
        personal_statement: String,
    ) -> Result<Application, LifecycleError> {
        let mut application = self.load(id).await?;
        Self::ensure_owner(actor, &application)?;
        WorkflowService::ensure_editable(application.status())?;

        application.personal_statement = personal_statement;
        application.updated_at = Utc::now();
        let application = self.store.update_application(application).await?;

        debug!(application_id = %id, "personal statement updated");
        Ok(application)
    }

    /// Submit a draft into the scholarship's approval workflow.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, `InvalidTransition` unless draft,
    /// `MissingDocuments`, or `ConcurrentModification`.
    pub async fn submit(
        &self,
        actor: &Actor,
        id: ApplicationId,
    ) -> Result<Application, LifecycleError> {
        let mut application = self.load(id).await?;
        Self::ensure_owner(actor, &application)?;
        let scholarship = self.load_scholarship(application.scholarship_id).await?;

        let transition =
            WorkflowService::submit(application.status(), self.workflow_of(&scholarship))?;
        self.ensure_documents(&application).await?;

        let from = application.status();
        application.apply(&transition)?;
        let application = self.store.update_application(application).await?;

        Self::log_transition(&application, actor, from);
        self.notify(
            &application,
            NotificationKind::ApplicationSubmitted,
            "Application submitted",
            format!("Your application for {} was submitted for review.", scholarship.name),
        );
        self.audit(actor, "submit", &application, Some(from));

        Ok(application)
    }

    /// Record a review decision on the current step.
    ///
    /// On approval of the last step a recipient slot is reserved before the
    /// decision is committed, and a pending payment is created after.
    ///
    /// # Errors
    ///
    /// - `NotFound`
    /// - `InvalidTransition` unless submitted or under review
    /// - `OutOfTurn` if the reviewer holds another step of the workflow
    /// - `NotAuthorizedForStep` / `UnmappedStep` if the reviewer holds none
    /// - `RejectionReasonRequired`, `ScoreOutOfRange` on bad input
    /// - `NoRecipientSlots` if the final approval finds no slot left
    /// - `ConcurrentModification` if another review committed first
    pub async fn review(
        &self,
        actor: &Actor,
        id: ApplicationId,
        request: ReviewRequest,
    ) -> Result<ReviewOutcome, LifecycleError> {
        let mut application = self.load(id).await?;
        let scholarship = self.load_scholarship(application.scholarship_id).await?;
        let workflow = self.workflow_of(&scholarship);

        let action = match request.decision {
            ReviewDecision::Approve => "approve",
            ReviewDecision::Reject { .. } => "reject",
        };
        let step = ApprovalEngine::reviewable_step(
            application.status(),
            application.current_approval_step(),
            action,
        )?;
        if let Err(error) = self.authority.authorize(workflow, step, actor.role) {
            debug!(application_id = %id, role = actor.role.as_str(), step, %error, "review refused");
            return Err(error.into());
        }
        ApprovalEngine::validate_score(request.score)?;

        let transition = match request.decision {
            ReviewDecision::Approve => ApprovalEngine::approve(
                application.status(),
                application.current_approval_step(),
                workflow,
                actor.user_id,
                request.comments,
            )?,
            ReviewDecision::Reject { reason } => ApprovalEngine::reject(
                application.status(),
                application.current_approval_step(),
                actor.user_id,
                reason,
            )?,
        };
        let entry = transition
            .history_entry()
            .cloned()
            .ok_or(WorkflowError::NoCurrentStep)?;

        let from = application.status();
        application.apply(&transition)?;
        application.record_score(request.score);
        application.record_ranking(request.ranking);
        let approval =
            Approval::from_entry(application.id, &entry, request.score, request.criteria_scores);

        let granted = transition.is_final_approval();
        if granted {
            self.store.reserve_recipient_slot(scholarship.id).await?;
        }

        let application = match self.store.record_review(application, approval.clone()).await {
            Ok(application) => application,
            Err(error) => {
                if granted {
                    self.release_slot(&scholarship).await;
                }
                return Err(error.into());
            }
        };

        Self::log_transition(&application, actor, from);

        let payment = if granted {
            self.create_payment(&application, &scholarship).await
        } else {
            None
        };

        self.notify_decision(&application, &transition, &scholarship);
        self.audit(actor, action, &application, Some(from));

        Ok(ReviewOutcome {
            application,
            approval,
            payment,
        })
    }

    /// Withdraw an application that is still in the workflow.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or `InvalidTransition` from draft or a
    /// terminal status.
    pub async fn withdraw(
        &self,
        actor: &Actor,
        id: ApplicationId,
    ) -> Result<Application, LifecycleError> {
        let mut application = self.load(id).await?;
        Self::ensure_owner(actor, &application)?;

        let transition = WorkflowService::withdraw(application.status())?;
        let from = application.status();
        application.apply(&transition)?;
        let application = self.store.update_application(application).await?;

        Self::log_transition(&application, actor, from);
        self.notify(
            &application,
            NotificationKind::ApplicationWithdrawn,
            "Application withdrawn",
            "Your application was withdrawn.".to_string(),
        );
        self.audit(actor, "withdraw", &application, Some(from));

        Ok(application)
    }

    /// Pause review until the applicant uploads more documents.
    ///
    /// Only the reviewer holding the current step may ask.
    ///
    /// # Errors
    ///
    /// Same authority errors as [`review`](Self::review).
    pub async fn request_documents(
        &self,
        actor: &Actor,
        id: ApplicationId,
        message: Option<String>,
    ) -> Result<Application, LifecycleError> {
        let mut application = self.load(id).await?;
        let scholarship = self.load_scholarship(application.scholarship_id).await?;

        let step = ApprovalEngine::reviewable_step(
            application.status(),
            application.current_approval_step(),
            "request documents for",
        )?;
        self.authority
            .authorize(self.workflow_of(&scholarship), step, actor.role)?;

        let transition = WorkflowService::request_documents(application.status())?;
        let from = application.status();
        application.apply(&transition)?;
        let application = self.store.update_application(application).await?;

        Self::log_transition(&application, actor, from);
        self.notify(
            &application,
            NotificationKind::DocumentsRequested,
            "Documents requested",
            message.unwrap_or_else(|| {
                "A reviewer requested additional documents for your application.".to_string()
            }),
        );
        self.audit(actor, "request_documents", &application, Some(from));

        Ok(application)
    }

    /// Return an application to review once the documents are in.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, `InvalidTransition` unless pending documents,
    /// or `MissingDocuments`.
    pub async fn resume_review(
        &self,
        actor: &Actor,
        id: ApplicationId,
    ) -> Result<Application, LifecycleError> {
        let mut application = self.load(id).await?;
        Self::ensure_owner(actor, &application)?;

        let transition = WorkflowService::resume_review(application.status())?;
        self.ensure_documents(&application).await?;

        let from = application.status();
        application.apply(&transition)?;
        let application = self.store.update_application(application).await?;

        Self::log_transition(&application, actor, from);
        self.audit(actor, "resume_review", &application, Some(from));

        Ok(application)
    }

    /// Physically remove a draft application.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or `InvalidTransition` unless draft.
    pub async fn delete(&self, actor: &Actor, id: ApplicationId) -> Result<(), LifecycleError> {
        let application = self.load(id).await?;
        Self::ensure_owner(actor, &application)?;
        WorkflowService::ensure_deletable(application.status())?;

        self.store
            .delete_application(id, application.version)
            .await?;

        info!(application_id = %id, actor = %actor.user_id, "draft application deleted");
        self.audit(actor, "delete", &application, None);
        Ok(())
    }

    /// Waits for every queued notification and audit entry.
    pub async fn flush_side_effects(&self) {
        self.side_effects.flush().await;
    }

    async fn load(&self, id: ApplicationId) -> Result<Application, LifecycleError> {
        self.store
            .find_application(id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("application", id))
    }

    async fn load_scholarship(&self, id: ScholarshipId) -> Result<Scholarship, LifecycleError> {
        self.store
            .find_scholarship(id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("scholarship", id))
    }

    fn workflow_of<'a>(&'a self, scholarship: &'a Scholarship) -> &'a ApprovalWorkflow {
        scholarship
            .approval_workflow
            .as_ref()
            .unwrap_or(&self.default_workflow)
    }

    async fn ensure_documents(&self, application: &Application) -> Result<(), LifecycleError> {
        let required = self
            .documents
            .required_types(application.scholarship_id)
            .await?;
        if required.is_empty() {
            return Ok(());
        }

        let uploaded = self.documents.uploaded_types(application.id).await?;
        let missing: Vec<String> = required.difference(&uploaded).cloned().collect();
        if missing.is_empty() {
            Ok(())
        } else {
            debug!(application_id = %application.id, ?missing, "required documents missing");
            Err(LifecycleError::MissingDocuments { missing })
        }
    }

    fn ensure_owner(actor: &Actor, application: &Application) -> Result<(), LifecycleError> {
        if application.is_owned_by(actor.user_id) {
            Ok(())
        } else {
            debug!(application_id = %application.id, actor = %actor.user_id, "not the owner");
            Err(LifecycleError::Forbidden(
                "only the applicant may do this".to_string(),
            ))
        }
    }

    fn ensure_can_read(actor: &Actor, application: &Application) -> Result<(), LifecycleError> {
        if actor.role.is_staff() || application.is_owned_by(actor.user_id) {
            Ok(())
        } else {
            Err(LifecycleError::Forbidden(
                "application belongs to another student".to_string(),
            ))
        }
    }

    async fn release_slot(&self, scholarship: &Scholarship) {
        if let Err(error) = self.store.release_recipient_slot(scholarship.id).await {
            warn!(scholarship_id = %scholarship.id, %error, "recipient slot not released");
        }
    }

    async fn create_payment(
        &self,
        application: &Application,
        scholarship: &Scholarship,
    ) -> Option<Payment> {
        match self
            .payments
            .create_pending(application.id, scholarship.amount)
            .await
        {
            Ok(payment) => {
                info!(
                    application_id = %application.id,
                    payment_id = %payment.id,
                    amount = %payment.amount,
                    "pending payment created"
                );
                Some(payment)
            }
            Err(error) => {
                warn!(application_id = %application.id, %error, "payment creation failed");
                None
            }
        }
    }

    fn log_transition(application: &Application, actor: &Actor, from: ApplicationStatus) {
        info!(
            application_id = %application.id,
            actor = %actor.user_id,
            role = actor.role.as_str(),
            %from,
            to = %application.status(),
            step = application.current_approval_step().unwrap_or("-"),
            "application transitioned"
        );
    }

    fn notify_decision(
        &self,
        application: &Application,
        transition: &WorkflowTransition,
        scholarship: &Scholarship,
    ) {
        let (kind, title, message) = match transition {
            WorkflowTransition::Advance { next_step, .. } => (
                NotificationKind::ApplicationAdvanced,
                "Application moved forward",
                format!("Your application for {} is now at the {next_step} step.", scholarship.name),
            ),
            WorkflowTransition::Approve { .. } => (
                NotificationKind::ApplicationApproved,
                "Scholarship awarded",
                format!("Congratulations, you were awarded {}.", scholarship.name),
            ),
            WorkflowTransition::Reject {
                rejection_reason, ..
            } => (
                NotificationKind::ApplicationRejected,
                "Application not successful",
                format!(
                    "Your application for {} was not successful: {rejection_reason}",
                    scholarship.name
                ),
            ),
            _ => return,
        };
        self.notify(application, kind, title, message);
    }

    fn notify(
        &self,
        application: &Application,
        kind: NotificationKind,
        title: &str,
        message: String,
    ) {
        self.side_effects.notify(Notification {
            recipient: application.applicant_id,
            kind,
            title: title.to_string(),
            message,
            data: json!({
                "application_id": application.id,
                "scholarship_id": application.scholarship_id,
                "status": application.status(),
                "current_step": application.current_approval_step(),
            }),
        });
    }

    fn audit(
        &self,
        actor: &Actor,
        action: &str,
        application: &Application,
        from: Option<ApplicationStatus>,
    ) {
        self.side_effects.audit(AuditEntry {
            actor_id: actor.user_id,
            action: action.to_string(),
            resource_type: "application".to_string(),
            resource_id: application.id.to_string(),
            old_values: from.map(|status| json!({ "status": status })),
            new_values: Some(json!({
                "status": application.status(),
                "current_step": application.current_approval_step(),
            })),
        });
    }
}
