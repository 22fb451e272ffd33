//! Shared fixtures for lifecycle integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use scholarflow_core::application::{Actor, Application, ApplicationService, NewApplication};
use scholarflow_core::eligibility::StudentProfile;
use scholarflow_core::scholarship::{DepartmentScope, Scholarship, ScholarshipStatus};
use scholarflow_core::workflow::{ApprovalWorkflow, UserRole};
use scholarflow_db::{AuditTrail, MemoryDocuments, MemoryPaymentLedger, MemoryStore, NotificationOutbox};
use scholarflow_shared::{AppConfig, ScholarshipId, StudentId, UserId};

/// Lifecycle service wired to the in-memory adapters.
pub type Service = ApplicationService<
    MemoryStore,
    MemoryDocuments,
    NotificationOutbox,
    AuditTrail,
    MemoryPaymentLedger,
>;

/// Service plus handles on every adapter and one seeded scholarship.
pub struct Harness {
    pub service: Arc<Service>,
    pub store: Arc<MemoryStore>,
    pub documents: Arc<MemoryDocuments>,
    pub outbox: Arc<NotificationOutbox>,
    pub audit: Arc<AuditTrail>,
    pub payments: Arc<MemoryPaymentLedger>,
    pub scholarship: Scholarship,
}

impl Harness {
    /// Default configuration, scholarship with a `coordinator, committee` workflow.
    pub fn new() -> Self {
        Self::build(AppConfig::default(), Some(&["coordinator", "committee"]))
    }

    /// Custom configuration and scholarship workflow (`None` uses the default).
    pub fn build(config: AppConfig, steps: Option<&[&str]>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let documents = Arc::new(MemoryDocuments::new());
        let outbox = Arc::new(NotificationOutbox::new());
        let audit = Arc::new(AuditTrail::new());
        let payments = Arc::new(MemoryPaymentLedger::new());

        let scholarship = scholarship(steps);
        store.insert_scholarship(scholarship.clone());

        let service = ApplicationService::new(
            Arc::clone(&store),
            Arc::clone(&documents),
            Arc::clone(&outbox),
            Arc::clone(&audit),
            Arc::clone(&payments),
            &config,
        )
        .expect("valid workflow configuration");

        Self {
            service: Arc::new(service),
            store,
            documents,
            outbox,
            audit,
            payments,
            scholarship,
        }
    }

    /// Replaces the seeded scholarship.
    pub fn update_scholarship(&mut self, update: impl FnOnce(&mut Scholarship)) {
        update(&mut self.scholarship);
        self.store.insert_scholarship(self.scholarship.clone());
    }

    /// Seeds a student with the given GPA and returns the acting user.
    pub fn enroll(&self, gpa: Decimal) -> Actor {
        let student = StudentProfile {
            id: StudentId::new(),
            user_id: UserId::new(),
            department: "Computer Science".to_string(),
            year_of_study: 3,
            gpa,
            financial_need_score: 65,
        };
        let actor = Actor::new(student.user_id, UserRole::Student);
        self.store.insert_student(student);
        actor
    }

    /// Creates a draft for a freshly enrolled eligible student.
    pub async fn draft(&self) -> (Actor, Application) {
        let student = self.enroll(dec!(3.8));
        let application = self
            .service
            .create(&student, self.new_application())
            .await
            .expect("draft created");
        (student, application)
    }

    /// Creates and submits an application.
    pub async fn submitted(&self) -> (Actor, Application) {
        let (student, draft) = self.draft().await;
        let application = self
            .service
            .submit(&student, draft.id)
            .await
            .expect("application submitted");
        (student, application)
    }

    pub fn new_application(&self) -> NewApplication {
        NewApplication {
            scholarship_id: self.scholarship.id,
            personal_statement: "I would like to study distributed systems.".to_string(),
        }
    }
}

/// A staff member with the given role.
pub fn staff(role: UserRole) -> Actor {
    Actor::new(UserId::new(), role)
}

/// The seeded "STEM Excellence" offer, with an optional workflow override.
pub fn scholarship(steps: Option<&[&str]>) -> Scholarship {
    Scholarship {
        id: ScholarshipId::new(),
        name: "STEM Excellence".to_string(),
        amount: dec!(5000),
        total_funding: dec!(25000),
        max_recipients: 5,
        current_recipients: 0,
        application_deadline: Utc::now() + Duration::days(30),
        min_gpa: Some(dec!(3.5)),
        department: DepartmentScope::All,
        year_of_study: BTreeSet::new(),
        approval_workflow: steps
            .map(|steps| ApprovalWorkflow::new(steps.iter().copied()).expect("valid workflow")),
        eligibility_rules: Vec::new(),
        status: ScholarshipStatus::Active,
        created_by: UserId::new(),
    }
}
