//! Application workflow management for Scholarflow.
//!
//! This module implements the application lifecycle state machine and
//! the multi-step approval engine.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (ApplicationStatus, ApprovalHistory, WorkflowTransition)
//! - `error` - Workflow-specific error types
//! - `steps` - Ordered approval steps
//! - `service` - Lifecycle state transitions
//! - `approval` - Review decisions and step authority

pub mod approval;
pub mod error;
pub mod service;
pub mod steps;
pub mod types;

#[cfg(test)]
mod approval_props;
#[cfg(test)]
mod service_props;

pub use approval::{ApprovalEngine, StepAuthority, UserRole};
pub use error::WorkflowError;
pub use service::WorkflowService;
pub use steps::ApprovalWorkflow;
pub use types::{ApplicationStatus, ApprovalAction, ApprovalHistory, HistoryEntry, WorkflowTransition};
