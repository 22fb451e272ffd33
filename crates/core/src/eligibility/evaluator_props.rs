//! Property tests for eligibility evaluation.

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use scholarflow_shared::{ScholarshipId, StudentId, UserId};
use serde_json::json;

use crate::eligibility::{EligibilityEvaluator, EligibilityRule, StudentProfile};
use crate::scholarship::{DepartmentScope, Scholarship, ScholarshipStatus};

/// GPA in 0.00-4.00 with two decimal places.
fn gpa_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=400).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

fn student(gpa: Decimal, need: u8) -> StudentProfile {
    StudentProfile {
        id: StudentId::new(),
        user_id: UserId::new(),
        department: "Engineering".to_string(),
        year_of_study: 2,
        gpa,
        financial_need_score: need,
    }
}

fn scholarship(min_gpa: Option<Decimal>, rules: Vec<EligibilityRule>) -> Scholarship {
    Scholarship {
        id: ScholarshipId::new(),
        name: "Access Grant".to_string(),
        amount: Decimal::new(1000, 0),
        total_funding: Decimal::new(10000, 0),
        max_recipients: 10,
        current_recipients: 0,
        application_deadline: Utc::now() + Duration::days(7),
        min_gpa,
        department: DepartmentScope::All,
        year_of_study: BTreeSet::new(),
        approval_workflow: None,
        eligibility_rules: rules,
        status: ScholarshipStatus::Active,
        created_by: UserId::new(),
    }
}

proptest! {
    /// A GPA below the minimum is never eligible, whatever the rules say.
    #[test]
    fn prop_gpa_below_minimum_is_ineligible(
        gpa in gpa_strategy(),
        min_gpa in gpa_strategy(),
        need in 0u8..=100,
    ) {
        prop_assume!(gpa < min_gpa);
        let rules = vec![EligibilityRule::from_raw("custom", "equals", json!("anything"), true, 1)];
        let offer = scholarship(Some(min_gpa), rules);
        prop_assert!(!EligibilityEvaluator::is_eligible(&student(gpa, need), &offer));
    }

    /// Without a minimum GPA the baseline accepts every GPA.
    #[test]
    fn prop_no_minimum_accepts_any_gpa(gpa in gpa_strategy(), need in 0u8..=100) {
        let offer = scholarship(None, Vec::new());
        prop_assert!(EligibilityEvaluator::is_eligible(&student(gpa, need), &offer));
    }

    /// Optional rules never change the outcome.
    #[test]
    fn prop_optional_rules_are_informational(
        gpa in gpa_strategy(),
        need in 0u8..=100,
        threshold in 0u8..=100,
    ) {
        let profile = student(gpa, need);
        let without = scholarship(None, Vec::new());
        let with = scholarship(
            None,
            vec![EligibilityRule::from_raw("financial_need", "greater_than", json!(threshold), false, 3)],
        );
        prop_assert_eq!(
            EligibilityEvaluator::is_eligible(&profile, &without),
            EligibilityEvaluator::is_eligible(&profile, &with)
        );
    }

    /// `is_eligible` agrees with the diagnostic report.
    #[test]
    fn prop_report_agrees_with_gate(
        gpa in gpa_strategy(),
        min_gpa in proptest::option::of(gpa_strategy()),
        need in 0u8..=100,
        threshold in 0u8..=100,
        required in any::<bool>(),
    ) {
        let profile = student(gpa, need);
        let offer = scholarship(
            min_gpa,
            vec![EligibilityRule::from_raw("financial_need", "greater_than", json!(threshold), required, 3)],
        );
        let report = EligibilityEvaluator::assess(&profile, &offer);
        prop_assert_eq!(report.is_eligible(), EligibilityEvaluator::is_eligible(&profile, &offer));
    }
}
