//! Core business logic for Scholarflow.
//!
//! This crate contains the scholarship application domain with no storage
//! or transport dependencies. Persistence and delivery are reached through
//! the traits in [`application::ports`].
//!
//! # Modules
//!
//! - `eligibility` - Rule evaluation against a student profile
//! - `scholarship` - Scholarship offers
//! - `workflow` - Application state machine and approval engine
//! - `application` - Lifecycle service and its collaborator ports

pub mod application;
pub mod eligibility;
pub mod scholarship;
pub mod workflow;
