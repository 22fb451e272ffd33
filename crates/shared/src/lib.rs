//! Shared identifiers, errors, and configuration for Scholarflow.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Layered configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LoggingConfig, SideEffectConfig, WorkflowConfig};
pub use error::{AppError, AppResult};
pub use types::*;
