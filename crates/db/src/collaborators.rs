//! In-memory document registry, payment ledger, notification outbox and
//! audit trail.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use scholarflow_core::application::{
    AuditEntry, AuditSink, DocumentChecker, Notification, NotificationSink, Payment,
    PaymentFactory, PaymentStatus, RepositoryError, SinkError,
};
use scholarflow_shared::{ApplicationId, PaymentId, ScholarshipId};
use tokio::sync::Mutex;

/// Required and uploaded document types.
#[derive(Debug, Default)]
pub struct MemoryDocuments {
    required: DashMap<ScholarshipId, BTreeSet<String>>,
    uploaded: DashMap<ApplicationId, BTreeSet<String>>,
}

impl MemoryDocuments {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a document type a scholarship requires.
    pub fn require(&self, scholarship_id: ScholarshipId, document_type: impl Into<String>) {
        self.required
            .entry(scholarship_id)
            .or_default()
            .insert(document_type.into());
    }

    /// Records an uploaded document for an application.
    pub fn upload(&self, application_id: ApplicationId, document_type: impl Into<String>) {
        self.uploaded
            .entry(application_id)
            .or_default()
            .insert(document_type.into());
    }
}

impl DocumentChecker for MemoryDocuments {
    async fn required_types(
        &self,
        scholarship_id: ScholarshipId,
    ) -> Result<BTreeSet<String>, RepositoryError> {
        Ok(self
            .required
            .get(&scholarship_id)
            .map(|types| types.clone())
            .unwrap_or_default())
    }

    async fn uploaded_types(
        &self,
        application_id: ApplicationId,
    ) -> Result<BTreeSet<String>, RepositoryError> {
        Ok(self
            .uploaded
            .get(&application_id)
            .map(|types| types.clone())
            .unwrap_or_default())
    }
}

/// Pending payments, at most one per application.
#[derive(Debug, Default)]
pub struct MemoryPaymentLedger {
    payments: DashMap<ApplicationId, Payment>,
    failing: AtomicBool,
}

impl MemoryPaymentLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every creation fail while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns the payment of an application.
    #[must_use]
    pub fn payment_for(&self, application_id: ApplicationId) -> Option<Payment> {
        self.payments.get(&application_id).map(|p| p.clone())
    }

    /// Number of payments created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    /// Returns true if no payment was created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

impl PaymentFactory for MemoryPaymentLedger {
    async fn create_pending(
        &self,
        application_id: ApplicationId,
        amount: Decimal,
    ) -> Result<Payment, SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Delivery("payment ledger unavailable".to_string()));
        }

        match self.payments.entry(application_id) {
            Entry::Occupied(_) => Err(SinkError::Delivery(format!(
                "application {application_id} already has a payment"
            ))),
            Entry::Vacant(slot) => {
                let payment = Payment {
                    id: PaymentId::new(),
                    application_id,
                    amount,
                    status: PaymentStatus::Pending,
                    created_at: Utc::now(),
                };
                slot.insert(payment.clone());
                Ok(payment)
            }
        }
    }
}

/// Captures notifications instead of sending them.
#[derive(Debug, Default)]
pub struct NotificationOutbox {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl NotificationOutbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every delivery fail while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns the delivered notifications in delivery order.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

impl NotificationSink for NotificationOutbox {
    async fn notify(&self, notification: Notification) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Delivery("notification channel down".to_string()));
        }
        self.sent.lock().await.push(notification);
        Ok(())
    }
}

/// Captures audit entries.
#[derive(Debug, Default)]
pub struct AuditTrail {
    entries: Mutex<Vec<AuditEntry>>,
    failing: AtomicBool,
}

impl AuditTrail {
    /// Creates an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write fail while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns the recorded entries in write order.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.clone()
    }
}

impl AuditSink for AuditTrail {
    async fn record(&self, entry: AuditEntry) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Delivery("audit store down".to_string()));
        }
        self.entries.lock().await.push(entry);
        Ok(())
    }
}
