//! Scholarship domain types.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use scholarflow_shared::{ScholarshipId, UserId};
use serde::{Deserialize, Serialize};

use crate::eligibility::EligibilityRule;
use crate::workflow::ApprovalWorkflow;

/// Publication status of a scholarship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScholarshipStatus {
    /// Being prepared, not visible to students.
    Draft,
    /// Open for applications.
    Active,
    /// No longer accepting applications.
    Closed,
    /// Withdrawn by the provider.
    Cancelled,
}

impl ScholarshipStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ScholarshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Departments a scholarship is open to.
///
/// Stored as the plain string `"all"` or a department name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DepartmentScope {
    /// Open to every department.
    All,
    /// Open to a single department.
    Only(String),
}

impl DepartmentScope {
    /// Returns true if a student from `department` may apply.
    #[must_use]
    pub fn admits(&self, department: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(required) => required == department,
        }
    }
}

impl From<String> for DepartmentScope {
    fn from(value: String) -> Self {
        if value == "all" {
            Self::All
        } else {
            Self::Only(value)
        }
    }
}

impl From<DepartmentScope> for String {
    fn from(scope: DepartmentScope) -> Self {
        match scope {
            DepartmentScope::All => "all".to_string(),
            DepartmentScope::Only(department) => department,
        }
    }
}

/// A scholarship offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scholarship {
    /// Unique identifier.
    pub id: ScholarshipId,
    /// Display name.
    pub name: String,
    /// Amount disbursed to each recipient.
    pub amount: Decimal,
    /// Total budget of the scholarship.
    pub total_funding: Decimal,
    /// Maximum number of recipients.
    pub max_recipients: u32,
    /// Recipients approved so far. Never exceeds `max_recipients`.
    pub current_recipients: u32,
    /// Applications are accepted strictly before this instant.
    pub application_deadline: DateTime<Utc>,
    /// Minimum GPA, if any.
    pub min_gpa: Option<Decimal>,
    /// Departments admitted.
    pub department: DepartmentScope,
    /// Years of study admitted; empty admits every year.
    pub year_of_study: BTreeSet<u8>,
    /// Review steps; `None` uses the configured default workflow.
    pub approval_workflow: Option<ApprovalWorkflow>,
    /// Additional eligibility rules.
    pub eligibility_rules: Vec<EligibilityRule>,
    /// Publication status.
    pub status: ScholarshipStatus,
    /// The user who owns the scholarship.
    pub created_by: UserId,
}

impl Scholarship {
    /// Returns true if the scholarship accepts applications at `now`.
    #[must_use]
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ScholarshipStatus::Active && self.application_deadline > now
    }

    /// Returns the number of recipient slots still available.
    #[must_use]
    pub fn remaining_slots(&self) -> u32 {
        self.max_recipients.saturating_sub(self.current_recipients)
    }

    /// Returns true if at least one recipient slot is available.
    #[must_use]
    pub fn has_open_slot(&self) -> bool {
        self.remaining_slots() > 0
    }
}
