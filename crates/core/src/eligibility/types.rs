//! Eligibility domain types.
//!
//! Rules arrive from storage as `(rule_type, operator, value)` string
//! triples. They are parsed once into [`Criterion`] so evaluation is an
//! exhaustive match instead of string dispatch.

use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use scholarflow_shared::{EligibilityRuleId, StudentId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Academic profile of a student, as used for eligibility checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Unique identifier.
    pub id: StudentId,
    /// The user that owns this profile.
    pub user_id: UserId,
    /// Department name.
    pub department: String,
    /// Year of study, 1-6.
    pub year_of_study: u8,
    /// Grade point average, 0.0-4.0.
    pub gpa: Decimal,
    /// Financial need score, 0-100.
    pub financial_need_score: u8,
}

/// Comparison operator of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    /// Attribute equals the value.
    Equals,
    /// Attribute is strictly greater than the value.
    GreaterThan,
    /// Attribute is strictly less than the value.
    LessThan,
    /// Attribute is a member of the value list.
    In,
    /// Attribute is not a member of the value list.
    NotIn,
    /// Attribute contains the value, ignoring case.
    Contains,
}

impl RuleOperator {
    /// Parse an operator from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "equals" => Some(Self::Equals),
            "greater_than" => Some(Self::GreaterThan),
            "less_than" => Some(Self::LessThan),
            "in" => Some(Self::In),
            "not_in" => Some(Self::NotIn),
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }

    /// Returns the string representation of the operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Contains => "contains",
        }
    }
}

/// Value a rule compares against, or a student attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum RuleValue {
    /// A number.
    Number(Decimal),
    /// A string.
    Text(String),
    /// A boolean.
    Flag(bool),
    /// A list, used by `in` and `not_in`.
    List(Vec<RuleValue>),
    /// Missing or unusable (null, objects, numbers that do not fit a decimal).
    Absent,
}

impl RuleValue {
    /// Returns the value as a number, parsing numeric strings.
    #[must_use]
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the value coerced to a string. Lists and absent values have none.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Number(n) => Some(n.normalize().to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Flag(b) => Some(b.to_string()),
            Self::List(_) | Self::Absent => None,
        }
    }
}

impl From<Value> for RuleValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => n
                .to_string()
                .parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .map_or(Self::Absent, Self::Number),
            Value::String(s) => Self::Text(s),
            Value::Bool(b) => Self::Flag(b),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Null | Value::Object(_) => Self::Absent,
        }
    }
}

impl From<RuleValue> for Value {
    fn from(value: RuleValue) -> Self {
        match value {
            RuleValue::Number(n) => n
                .normalize()
                .to_string()
                .parse::<serde_json::Number>()
                .map_or_else(|_| Value::String(n.to_string()), Value::Number),
            RuleValue::Text(s) => Value::String(s),
            RuleValue::Flag(b) => Value::Bool(b),
            RuleValue::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            RuleValue::Absent => Value::Null,
        }
    }
}

/// Operator and expected value of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// How the attribute is compared.
    pub operator: RuleOperator,
    /// What the attribute is compared against.
    pub value: RuleValue,
}

impl Comparison {
    /// Creates a comparison.
    #[must_use]
    pub fn new(operator: RuleOperator, value: impl Into<RuleValue>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }
}

impl From<Decimal> for RuleValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RuleValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// What a rule checks.
///
/// Only the first four kinds map to a student attribute. The other
/// recognised kinds and unrecognised rule types pass without comparing;
/// a recognised kind with an unknown operator never passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// Compared against the student's GPA.
    GpaMinimum(Comparison),
    /// Compared against the student's department.
    Department(Comparison),
    /// Compared against the student's year of study.
    YearOfStudy(Comparison),
    /// Compared against the student's financial need score.
    FinancialNeed(Comparison),
    /// Academic achievement (no profile attribute).
    AcademicAchievement(Comparison),
    /// Extracurricular involvement (no profile attribute).
    Extracurricular(Comparison),
    /// Provider-defined criterion (no profile attribute).
    Custom(Comparison),
    /// Rule type this system does not know.
    Unrecognized {
        /// The stored rule type.
        rule_type: String,
        /// The stored operator.
        operator: String,
        /// The stored value.
        value: RuleValue,
    },
    /// Known rule type with an operator this system does not know.
    Malformed {
        /// The stored rule type.
        rule_type: String,
        /// The stored operator.
        operator: String,
        /// The stored value.
        value: RuleValue,
    },
}

impl Criterion {
    /// Parses the stored string triple.
    #[must_use]
    pub fn parse(rule_type: &str, operator: &str, value: RuleValue) -> Self {
        let build: fn(Comparison) -> Self = match rule_type {
            "gpa_minimum" => Self::GpaMinimum,
            "department" => Self::Department,
            "year_of_study" => Self::YearOfStudy,
            "financial_need" => Self::FinancialNeed,
            "academic_achievement" => Self::AcademicAchievement,
            "extracurricular" => Self::Extracurricular,
            "custom" => Self::Custom,
            _ => {
                return Self::Unrecognized {
                    rule_type: rule_type.to_string(),
                    operator: operator.to_string(),
                    value,
                };
            }
        };

        match RuleOperator::parse(operator) {
            Some(operator) => build(Comparison { operator, value }),
            None => Self::Malformed {
                rule_type: rule_type.to_string(),
                operator: operator.to_string(),
                value,
            },
        }
    }

    /// Returns the stored rule type name.
    #[must_use]
    pub fn rule_type(&self) -> &str {
        match self {
            Self::GpaMinimum(_) => "gpa_minimum",
            Self::Department(_) => "department",
            Self::YearOfStudy(_) => "year_of_study",
            Self::FinancialNeed(_) => "financial_need",
            Self::AcademicAchievement(_) => "academic_achievement",
            Self::Extracurricular(_) => "extracurricular",
            Self::Custom(_) => "custom",
            Self::Unrecognized { rule_type, .. } | Self::Malformed { rule_type, .. } => rule_type,
        }
    }

    fn into_raw_parts(self) -> (String, String, RuleValue) {
        let rule_type = self.rule_type().to_string();
        match self {
            Self::GpaMinimum(c)
            | Self::Department(c)
            | Self::YearOfStudy(c)
            | Self::FinancialNeed(c)
            | Self::AcademicAchievement(c)
            | Self::Extracurricular(c)
            | Self::Custom(c) => (rule_type, c.operator.as_str().to_string(), c.value),
            Self::Unrecognized {
                operator, value, ..
            }
            | Self::Malformed {
                operator, value, ..
            } => (rule_type, operator, value),
        }
    }
}

/// A declarative predicate attached to a scholarship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEligibilityRule", into = "RawEligibilityRule")]
pub struct EligibilityRule {
    /// Unique identifier.
    pub id: EligibilityRuleId,
    /// What the rule checks.
    pub criterion: Criterion,
    /// Required rules gate eligibility; the rest are informational.
    pub is_required: bool,
    /// Scoring weight, 1-10. Not used by the eligibility gate.
    pub weight: u8,
}

impl EligibilityRule {
    /// Creates a rule from a parsed criterion.
    #[must_use]
    pub fn new(criterion: Criterion, is_required: bool, weight: u8) -> Self {
        Self {
            id: EligibilityRuleId::new(),
            criterion,
            is_required,
            weight: weight.clamp(1, 10),
        }
    }

    /// Creates a rule from its stored string form.
    #[must_use]
    pub fn from_raw(
        rule_type: &str,
        operator: &str,
        value: Value,
        is_required: bool,
        weight: u8,
    ) -> Self {
        Self::new(
            Criterion::parse(rule_type, operator, RuleValue::from(value)),
            is_required,
            weight,
        )
    }
}

/// Stored form of an eligibility rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEligibilityRule {
    /// Unique identifier.
    pub id: EligibilityRuleId,
    /// Rule type name.
    pub rule_type: String,
    /// Operator name.
    pub operator: String,
    /// Expected value.
    #[serde(default)]
    pub value: Value,
    /// Whether the rule gates eligibility.
    #[serde(default)]
    pub is_required: bool,
    /// Scoring weight.
    #[serde(default = "default_weight")]
    pub weight: u8,
}

fn default_weight() -> u8 {
    1
}

impl From<RawEligibilityRule> for EligibilityRule {
    fn from(raw: RawEligibilityRule) -> Self {
        Self {
            id: raw.id,
            criterion: Criterion::parse(&raw.rule_type, &raw.operator, RuleValue::from(raw.value)),
            is_required: raw.is_required,
            weight: raw.weight.clamp(1, 10),
        }
    }
}

impl From<EligibilityRule> for RawEligibilityRule {
    fn from(rule: EligibilityRule) -> Self {
        let (rule_type, operator, value) = rule.criterion.into_raw_parts();
        Self {
            id: rule.id,
            rule_type,
            operator,
            value: Value::from(value),
            is_required: rule.is_required,
            weight: rule.weight,
        }
    }
}

/// Outcome of one rule for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleEvaluation {
    /// The rule evaluated.
    pub rule_id: EligibilityRuleId,
    /// The rule's type name.
    pub rule_type: String,
    /// Whether the rule gates eligibility.
    pub required: bool,
    /// Whether the student satisfied the rule.
    pub passed: bool,
}

/// A failed scholarship-level requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum BaselineFailure {
    /// GPA below the scholarship minimum.
    MinimumGpa {
        /// Required minimum.
        required: Decimal,
        /// Student GPA.
        actual: Decimal,
    },
    /// Department not admitted.
    Department {
        /// Admitted department.
        required: String,
        /// Student department.
        actual: String,
    },
    /// Year of study not admitted.
    YearOfStudy {
        /// Admitted years.
        allowed: BTreeSet<u8>,
        /// Student year.
        actual: u8,
    },
}

impl fmt::Display for BaselineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinimumGpa { required, actual } => {
                write!(f, "GPA {actual} is below the minimum of {required}")
            }
            Self::Department { required, actual } => {
                write!(f, "department {actual} is not {required}")
            }
            Self::YearOfStudy { allowed, actual } => {
                let allowed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                write!(f, "year {actual} is not one of {}", allowed.join(", "))
            }
        }
    }
}

/// Full eligibility assessment of a student for a scholarship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EligibilityReport {
    /// Scholarship-level requirements the student failed.
    pub baseline_failures: Vec<BaselineFailure>,
    /// Outcome of every attached rule, required or not.
    pub rules: Vec<RuleEvaluation>,
}

impl EligibilityReport {
    /// True when every baseline check and every required rule passed.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.baseline_failures.is_empty()
            && self
                .rules
                .iter()
                .filter(|rule| rule.required)
                .all(|rule| rule.passed)
    }

    /// Human-readable reasons the student is not eligible.
    #[must_use]
    pub fn failure_reasons(&self) -> Vec<String> {
        self.baseline_failures
            .iter()
            .map(ToString::to_string)
            .chain(
                self.rules
                    .iter()
                    .filter(|rule| rule.required && !rule.passed)
                    .map(|rule| format!("required {} rule not met", rule.rule_type)),
            )
            .collect()
    }
}
