//! Application lifecycle.
//!
//! # Modules
//!
//! - `types` - Application, Approval and Payment records, command inputs
//! - `ports` - Repository and side-effect collaborator traits
//! - `dispatch` - Fire-and-forget notification and audit delivery
//! - `error` - Lifecycle errors and their classification
//! - `service` - The lifecycle façade

pub mod dispatch;
pub mod error;
pub mod ports;
pub mod service;
pub mod types;

pub use dispatch::SideEffectDispatcher;
pub use error::{ErrorKind, LifecycleError};
pub use ports::{
    ApplicationRepository, AuditEntry, AuditSink, DocumentChecker, Notification,
    NotificationKind, NotificationSink, PaymentFactory, RepositoryError, ScholarshipRepository,
    SinkError, Store, StudentRepository,
};
pub use service::ApplicationService;
pub use types::{
    Actor, Application, Approval, NewApplication, Payment, PaymentStatus, ReviewDecision,
    ReviewOutcome, ReviewRequest,
};
