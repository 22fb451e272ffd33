//! Scholarship offers that applications are made against.

pub mod types;

pub use types::{DepartmentScope, Scholarship, ScholarshipStatus};
