//! Eligibility evaluation.
//!
//! Pure functions that check a student profile against a scholarship's
//! baseline requirements and attached rules. Nothing here fails: a rule
//! whose value cannot be compared simply does not pass.

use rust_decimal::Decimal;

use crate::eligibility::types::{
    BaselineFailure, Comparison, Criterion, EligibilityReport, EligibilityRule, RuleEvaluation,
    RuleOperator, RuleValue, StudentProfile,
};
use crate::scholarship::Scholarship;

/// Stateless eligibility evaluator.
pub struct EligibilityEvaluator;

impl EligibilityEvaluator {
    /// Returns true if the student may apply for the scholarship.
    ///
    /// Non-required rules never affect the result.
    #[must_use]
    pub fn is_eligible(student: &StudentProfile, scholarship: &Scholarship) -> bool {
        Self::baseline_failures(student, scholarship).is_empty()
            && scholarship
                .eligibility_rules
                .iter()
                .filter(|rule| rule.is_required)
                .all(|rule| Self::evaluate_rule(student, rule))
    }

    /// Evaluates every attached rule, required or not.
    #[must_use]
    pub fn evaluate_all(student: &StudentProfile, scholarship: &Scholarship) -> Vec<RuleEvaluation> {
        scholarship
            .eligibility_rules
            .iter()
            .map(|rule| RuleEvaluation {
                rule_id: rule.id,
                rule_type: rule.criterion.rule_type().to_string(),
                required: rule.is_required,
                passed: Self::evaluate_rule(student, rule),
            })
            .collect()
    }

    /// Full diagnostic: baseline failures plus every rule outcome.
    #[must_use]
    pub fn assess(student: &StudentProfile, scholarship: &Scholarship) -> EligibilityReport {
        EligibilityReport {
            baseline_failures: Self::baseline_failures(student, scholarship),
            rules: Self::evaluate_all(student, scholarship),
        }
    }

    /// Evaluates a single rule against the student.
    #[must_use]
    pub fn evaluate_rule(student: &StudentProfile, rule: &EligibilityRule) -> bool {
        match &rule.criterion {
            Criterion::GpaMinimum(c) => Self::compare(&RuleValue::Number(student.gpa), c),
            Criterion::Department(c) => {
                Self::compare(&RuleValue::Text(student.department.clone()), c)
            }
            Criterion::YearOfStudy(c) => Self::compare(
                &RuleValue::Number(Decimal::from(student.year_of_study)),
                c,
            ),
            Criterion::FinancialNeed(c) => Self::compare(
                &RuleValue::Number(Decimal::from(student.financial_need_score)),
                c,
            ),
            // No profile attribute backs these; they pass like unknown types.
            Criterion::AcademicAchievement(_)
            | Criterion::Extracurricular(_)
            | Criterion::Custom(_)
            | Criterion::Unrecognized { .. } => true,
            Criterion::Malformed { .. } => false,
        }
    }

    /// Compares a student attribute against a rule's expected value.
    #[must_use]
    pub fn compare(actual: &RuleValue, comparison: &Comparison) -> bool {
        let expected = &comparison.value;
        match comparison.operator {
            RuleOperator::Equals => Self::equals(actual, expected),
            RuleOperator::GreaterThan => {
                matches!((actual.as_number(), expected.as_number()), (Some(a), Some(e)) if a > e)
            }
            RuleOperator::LessThan => {
                matches!((actual.as_number(), expected.as_number()), (Some(a), Some(e)) if a < e)
            }
            RuleOperator::In => match expected {
                RuleValue::List(items) => items.iter().any(|item| Self::equals(actual, item)),
                _ => false,
            },
            RuleOperator::NotIn => match expected {
                RuleValue::List(items) => !items.iter().any(|item| Self::equals(actual, item)),
                _ => false,
            },
            RuleOperator::Contains => match (actual.as_text(), expected.as_text()) {
                (Some(haystack), Some(needle)) => haystack
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
                _ => false,
            },
        }
    }

    fn equals(actual: &RuleValue, expected: &RuleValue) -> bool {
        if let (Some(a), Some(e)) = (actual.as_number(), expected.as_number()) {
            return a == e;
        }
        match (actual.as_text(), expected.as_text()) {
            (Some(a), Some(e)) => a == e,
            _ => false,
        }
    }

    fn baseline_failures(
        student: &StudentProfile,
        scholarship: &Scholarship,
    ) -> Vec<BaselineFailure> {
        let mut failures = Vec::new();

        if let Some(required) = scholarship.min_gpa
            && student.gpa < required
        {
            failures.push(BaselineFailure::MinimumGpa {
                required,
                actual: student.gpa,
            });
        }

        if !scholarship.department.admits(&student.department) {
            failures.push(BaselineFailure::Department {
                required: String::from(scholarship.department.clone()),
                actual: student.department.clone(),
            });
        }

        if !scholarship.year_of_study.is_empty()
            && !scholarship.year_of_study.contains(&student.year_of_study)
        {
            failures.push(BaselineFailure::YearOfStudy {
                allowed: scholarship.year_of_study.clone(),
                actual: student.year_of_study,
            });
        }

        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scholarship::{DepartmentScope, ScholarshipStatus};
    use chrono::{Duration, Utc};
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use scholarflow_shared::{ScholarshipId, StudentId, UserId};
    use serde_json::json;
    use std::collections::BTreeSet;

    fn student() -> StudentProfile {
        StudentProfile {
            id: StudentId::new(),
            user_id: UserId::new(),
            department: "Computer Science".to_string(),
            year_of_study: 3,
            gpa: dec!(3.8),
            financial_need_score: 70,
        }
    }

    fn scholarship(min_gpa: Option<Decimal>) -> Scholarship {
        Scholarship {
            id: ScholarshipId::new(),
            name: "STEM Excellence".to_string(),
            amount: dec!(5000),
            total_funding: dec!(50000),
            max_recipients: 10,
            current_recipients: 0,
            application_deadline: Utc::now() + Duration::days(30),
            min_gpa,
            department: DepartmentScope::All,
            year_of_study: BTreeSet::new(),
            approval_workflow: None,
            eligibility_rules: Vec::new(),
            status: ScholarshipStatus::Active,
            created_by: UserId::new(),
        }
    }

    fn rule(rule_type: &str, operator: &str, value: serde_json::Value, required: bool) -> EligibilityRule {
        EligibilityRule::from_raw(rule_type, operator, value, required, 5)
    }

    #[test]
    fn test_min_gpa_gate() {
        let offer = scholarship(Some(dec!(3.5)));
        assert!(EligibilityEvaluator::is_eligible(&student(), &offer));

        let mut weak = student();
        weak.gpa = dec!(3.4);
        assert!(!EligibilityEvaluator::is_eligible(&weak, &offer));
    }

    #[test]
    fn test_min_gpa_boundary_is_inclusive() {
        let mut exact = student();
        exact.gpa = dec!(3.5);
        assert!(EligibilityEvaluator::is_eligible(&exact, &scholarship(Some(dec!(3.50)))));
    }

    #[test]
    fn test_department_and_year_baseline() {
        let mut offer = scholarship(None);
        offer.department = DepartmentScope::Only("Physics".to_string());
        let report = EligibilityEvaluator::assess(&student(), &offer);
        assert!(!report.is_eligible());
        assert!(matches!(report.baseline_failures[0], BaselineFailure::Department { .. }));

        let mut offer = scholarship(None);
        offer.year_of_study = BTreeSet::from([1, 2]);
        assert!(!EligibilityEvaluator::is_eligible(&student(), &offer));
        offer.year_of_study.insert(3);
        assert!(EligibilityEvaluator::is_eligible(&student(), &offer));
    }

    #[test]
    fn test_optional_rules_never_block() {
        let mut offer = scholarship(None);
        offer
            .eligibility_rules
            .push(rule("financial_need", "greater_than", json!(90), false));

        assert!(EligibilityEvaluator::is_eligible(&student(), &offer));
        let evaluations = EligibilityEvaluator::evaluate_all(&student(), &offer);
        assert_eq!(evaluations.len(), 1);
        assert!(!evaluations[0].passed);
    }

    #[test]
    fn test_required_rule_blocks() {
        let mut offer = scholarship(None);
        offer
            .eligibility_rules
            .push(rule("financial_need", "greater_than", json!(90), true));
        assert!(!EligibilityEvaluator::is_eligible(&student(), &offer));
    }

    #[test]
    fn test_unrecognized_type_passes_and_bad_operator_fails() {
        let mut offer = scholarship(None);
        offer
            .eligibility_rules
            .push(rule("volunteer_hours", "greater_than", json!(100), true));
        assert!(EligibilityEvaluator::is_eligible(&student(), &offer));

        offer
            .eligibility_rules
            .push(rule("gpa_minimum", "at_least", json!(3.0), true));
        assert!(!EligibilityEvaluator::is_eligible(&student(), &offer));
    }

    #[rstest]
    #[case("gpa_minimum", "greater_than", json!(3.5), true)]
    #[case("gpa_minimum", "greater_than", json!("3.5"), true)]
    #[case("gpa_minimum", "less_than", json!(3.5), false)]
    #[case("gpa_minimum", "equals", json!(3.80), true)]
    #[case("gpa_minimum", "greater_than", json!(null), false)]
    #[case("gpa_minimum", "greater_than", json!("high"), false)]
    #[case("department", "equals", json!("Computer Science"), true)]
    #[case("department", "equals", json!("computer science"), false)]
    #[case("department", "contains", json!("SCIENCE"), true)]
    #[case("department", "in", json!(["Physics", "Computer Science"]), true)]
    #[case("department", "in", json!("Computer Science"), false)]
    #[case("department", "not_in", json!(["Physics"]), true)]
    #[case("department", "not_in", json!({"name": "Physics"}), false)]
    #[case("year_of_study", "in", json!([3, 4]), true)]
    #[case("year_of_study", "in", json!(["3"]), true)]
    #[case("year_of_study", "less_than", json!(3), false)]
    #[case("financial_need", "greater_than", json!(60), true)]
    #[case("financial_need", "contains", json!(7), true)]
    #[case("extracurricular", "equals", json!("debate"), true)]
    fn test_rule_operators(
        #[case] rule_type: &str,
        #[case] operator: &str,
        #[case] value: serde_json::Value,
        #[case] expected: bool,
    ) {
        let rule = rule(rule_type, operator, value, true);
        assert_eq!(EligibilityEvaluator::evaluate_rule(&student(), &rule), expected);
    }
}
