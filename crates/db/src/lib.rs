//! Storage and delivery adapters for Scholarflow.
//!
//! This crate provides:
//! - A concurrent in-memory store implementing the lifecycle repositories
//! - In-memory document registry, payment ledger, notification outbox and audit trail

pub mod collaborators;
pub mod store;

pub use collaborators::{AuditTrail, MemoryDocuments, MemoryPaymentLedger, NotificationOutbox};
pub use store::MemoryStore;
