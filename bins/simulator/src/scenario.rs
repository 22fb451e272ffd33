//! Sample scholarship, students and reviews.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use scholarflow_core::application::{Actor, ApplicationService, NewApplication, ReviewRequest};
use scholarflow_core::eligibility::{EligibilityRule, StudentProfile};
use scholarflow_core::scholarship::{DepartmentScope, Scholarship, ScholarshipStatus};
use scholarflow_core::workflow::{ApprovalWorkflow, UserRole};
use scholarflow_db::{
    AuditTrail, MemoryDocuments, MemoryPaymentLedger, MemoryStore, NotificationOutbox,
};
use scholarflow_shared::{AppConfig, ApplicationId, ScholarshipId, StudentId, UserId};

type Service = ApplicationService<
    MemoryStore,
    MemoryDocuments,
    NotificationOutbox,
    AuditTrail,
    MemoryPaymentLedger,
>;

/// Counts reported at the end of a run.
#[derive(Debug, Default)]
pub struct Summary {
    pub approved: usize,
    pub rejected: usize,
    pub refused: usize,
    pub payments: usize,
    pub notifications: usize,
    pub audit_entries: usize,
}

/// Runs the sample scenario against fresh in-memory adapters.
pub async fn run(config: &AppConfig) -> anyhow::Result<Summary> {
    let store = Arc::new(MemoryStore::new());
    let documents = Arc::new(MemoryDocuments::new());
    let outbox = Arc::new(NotificationOutbox::new());
    let audit = Arc::new(AuditTrail::new());
    let payments = Arc::new(MemoryPaymentLedger::new());

    let service: Service = ApplicationService::new(
        Arc::clone(&store),
        Arc::clone(&documents),
        Arc::clone(&outbox),
        Arc::clone(&audit),
        Arc::clone(&payments),
        config,
    )
    .context("invalid workflow configuration")?;

    let workflow = ApprovalWorkflow::from_config(&config.workflow)?;
    let scholarship = seed_scholarship(&store);
    documents.require(scholarship.id, "transcript");

    let mut summary = Summary::default();

    // Strong candidate: approved at every step.
    let strong = enroll(&store, "Computer Science", Decimal::new(38, 1), 72);
    if let Some(id) = apply(&service, &documents, &strong, &scholarship).await? {
        for step in workflow.steps() {
            let reviewer = reviewer_for(config, step);
            let review = ReviewRequest::approve(Some(format!("{step} approves")))
                .with_score(Decimal::new(88, 0));
            let outcome = service.review(&reviewer, id, review).await?;
            if let Some(payment) = outcome.payment {
                info!(payment_id = %payment.id, amount = %payment.amount, "Payment queued");
            }
        }
        summary.approved += 1;
    }

    // Borderline candidate: rejected at the first step.
    let borderline = enroll(&store, "Physics", Decimal::new(351, 2), 40);
    if let Some(id) = apply(&service, &documents, &borderline, &scholarship).await? {
        let reviewer = reviewer_for(config, workflow.first());
        service
            .review(
                &reviewer,
                id,
                ReviewRequest::reject("Statement does not address the research focus"),
            )
            .await?;
        summary.rejected += 1;
    }

    // Below the minimum GPA: refused at creation.
    let weak = enroll(&store, "History", Decimal::new(29, 1), 90);
    if apply(&service, &documents, &weak, &scholarship).await?.is_none() {
        summary.refused += 1;
    }

    service.flush_side_effects().await;
    summary.payments = payments.len();
    summary.notifications = outbox.sent().await.len();
    summary.audit_entries = audit.entries().await.len();

    Ok(summary)
}

/// Creates, documents and submits an application. Returns `None` if creation
/// was refused.
async fn apply(
    service: &Service,
    documents: &MemoryDocuments,
    student: &Actor,
    scholarship: &Scholarship,
) -> anyhow::Result<Option<ApplicationId>> {
    let draft = match service
        .create(
            student,
            NewApplication {
                scholarship_id: scholarship.id,
                personal_statement: "Sample statement".to_string(),
            },
        )
        .await
    {
        Ok(draft) => draft,
        Err(error) => {
            warn!(student = %student.user_id, %error, "Application refused");
            return Ok(None);
        }
    };

    documents.upload(draft.id, "transcript");
    service.submit(student, draft.id).await?;
    Ok(Some(draft.id))
}

fn seed_scholarship(store: &MemoryStore) -> Scholarship {
    let scholarship = Scholarship {
        id: ScholarshipId::new(),
        name: "Research Excellence Award".to_string(),
        amount: Decimal::new(5000, 0),
        total_funding: Decimal::new(50000, 0),
        max_recipients: 10,
        current_recipients: 0,
        application_deadline: Utc::now() + Duration::days(30),
        min_gpa: Some(Decimal::new(35, 1)),
        department: DepartmentScope::All,
        year_of_study: BTreeSet::from([2, 3, 4]),
        approval_workflow: None,
        eligibility_rules: vec![EligibilityRule::from_raw(
            "financial_need",
            "greater_than",
            serde_json::json!(30),
            false,
            4,
        )],
        status: ScholarshipStatus::Active,
        created_by: UserId::new(),
    };
    store.insert_scholarship(scholarship.clone());
    info!(scholarship_id = %scholarship.id, name = %scholarship.name, "Scholarship seeded");
    scholarship
}

fn enroll(store: &MemoryStore, department: &str, gpa: Decimal, need: u8) -> Actor {
    let student = StudentProfile {
        id: StudentId::new(),
        user_id: UserId::new(),
        department: department.to_string(),
        year_of_study: 3,
        gpa,
        financial_need_score: need,
    };
    let actor = Actor::new(student.user_id, UserRole::Student);
    store.insert_student(student);
    actor
}

/// A reviewer holding `step`, or an administrator when no role is mapped.
fn reviewer_for(config: &AppConfig, step: &str) -> Actor {
    let role = config
        .workflow
        .step_roles
        .get(step)
        .and_then(|role| UserRole::parse(role))
        .unwrap_or(UserRole::Admin);
    Actor::new(UserId::new(), role)
}
