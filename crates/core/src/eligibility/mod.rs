//! Eligibility rules and their evaluation against a student profile.

pub mod evaluator;
pub mod types;

#[cfg(test)]
mod evaluator_props;

pub use evaluator::EligibilityEvaluator;
pub use types::{
    BaselineFailure, Comparison, Criterion, EligibilityReport, EligibilityRule,
    RawEligibilityRule, RuleEvaluation, RuleOperator, RuleValue, StudentProfile,
};
