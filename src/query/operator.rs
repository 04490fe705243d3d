//! Operator catalog.
//!
//! Operator names are shared across field types (`equals` means
//! case-insensitive text equality for strings, numeric equality for numbers,
//! and same-calendar-day for dates); the evaluator picks semantics from the
//! field type, not from the operator alone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::query::field::FieldType;

/// Comparison operator named by a condition.
///
/// Operator names that are not recognised are preserved in
/// [`Operator::Other`] so stale saved queries still load and round-trip.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    /// `equals`
    Equals,
    /// `not_equals`
    NotEquals,
    /// `contains`
    Contains,
    /// `not_contains`
    NotContains,
    /// `starts_with`
    StartsWith,
    /// `ends_with`
    EndsWith,
    /// `is_empty`
    IsEmpty,
    /// `is_not_empty`
    IsNotEmpty,
    /// `greater_than`
    GreaterThan,
    /// `less_than`
    LessThan,
    /// `greater_or_equal`
    GreaterOrEqual,
    /// `less_or_equal`
    LessOrEqual,
    /// `between`, inclusive on both bounds.
    Between,
    /// `is_true`
    IsTrue,
    /// `is_false`
    IsFalse,
    /// `before`
    Before,
    /// `after`
    After,
    /// `in_last_days`
    InLastDays,
    /// `in_next_days`
    InNextDays,
    /// `in`, membership in a list of options.
    In,
    /// `not_in`
    NotIn,
    /// Any operator name this build does not know.
    Other(String),
}

impl Operator {
    /// Wire name of the operator.
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::GreaterOrEqual => "greater_or_equal",
            Operator::LessOrEqual => "less_or_equal",
            Operator::Between => "between",
            Operator::IsTrue => "is_true",
            Operator::IsFalse => "is_false",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::InLastDays => "in_last_days",
            Operator::InNextDays => "in_next_days",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Other(name) => name,
        }
    }

    /// Whether the operator reads the condition's primary value.
    pub fn takes_value(&self) -> bool {
        !matches!(
            self,
            Operator::IsEmpty
                | Operator::IsNotEmpty
                | Operator::IsTrue
                | Operator::IsFalse
                | Operator::Other(_)
        )
    }

    /// Whether the operator reads `secondValue` as an upper bound.
    pub fn takes_second_value(&self) -> bool {
        matches!(self, Operator::Between)
    }

    /// Whether the operator expects a list value.
    pub fn takes_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// Returns `true` if this operator is legal for `field_type`.
    pub fn is_allowed_for(&self, field_type: FieldType) -> bool {
        operators_for_type(field_type)
            .iter()
            .any(|info| &info.operator == self)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Operator {
    fn from(name: &str) -> Self {
        match name {
            "equals" => Operator::Equals,
            "not_equals" => Operator::NotEquals,
            "contains" => Operator::Contains,
            "not_contains" => Operator::NotContains,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "is_empty" => Operator::IsEmpty,
            "is_not_empty" => Operator::IsNotEmpty,
            "greater_than" => Operator::GreaterThan,
            "less_than" => Operator::LessThan,
            "greater_or_equal" => Operator::GreaterOrEqual,
            "less_or_equal" => Operator::LessOrEqual,
            "between" => Operator::Between,
            "is_true" => Operator::IsTrue,
            "is_false" => Operator::IsFalse,
            "before" => Operator::Before,
            "after" => Operator::After,
            "in_last_days" => Operator::InLastDays,
            "in_next_days" => Operator::InNextDays,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            other => Operator::Other(other.to_owned()),
        }
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        match Operator::from(name.as_str()) {
            Operator::Other(_) => Operator::Other(name),
            known => known,
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl FromStr for Operator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Operator::from(s))
    }
}

/// Operator paired with the label shown in the query builder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OperatorInfo {
    /// The operator.
    pub operator: Operator,
    /// Human-readable label.
    pub label: &'static str,
}

const fn info(operator: Operator, label: &'static str) -> OperatorInfo {
    OperatorInfo { operator, label }
}

static STRING_OPERATORS: [OperatorInfo; 8] = [
    info(Operator::Equals, "Equals"),
    info(Operator::NotEquals, "Does not equal"),
    info(Operator::Contains, "Contains"),
    info(Operator::NotContains, "Does not contain"),
    info(Operator::StartsWith, "Starts with"),
    info(Operator::EndsWith, "Ends with"),
    info(Operator::IsEmpty, "Is empty"),
    info(Operator::IsNotEmpty, "Is not empty"),
];

static NUMBER_OPERATORS: [OperatorInfo; 7] = [
    info(Operator::Equals, "Equals"),
    info(Operator::NotEquals, "Does not equal"),
    info(Operator::GreaterThan, "Greater than"),
    info(Operator::LessThan, "Less than"),
    info(Operator::GreaterOrEqual, "Greater than or equal"),
    info(Operator::LessOrEqual, "Less than or equal"),
    info(Operator::Between, "Between"),
];

static BOOLEAN_OPERATORS: [OperatorInfo; 2] = [
    info(Operator::IsTrue, "Is true"),
    info(Operator::IsFalse, "Is false"),
];

static DATE_OPERATORS: [OperatorInfo; 6] = [
    info(Operator::Equals, "Is on"),
    info(Operator::Before, "Before"),
    info(Operator::After, "After"),
    info(Operator::Between, "Between"),
    info(Operator::InLastDays, "In the last N days"),
    info(Operator::InNextDays, "In the next N days"),
];

static ARRAY_OPERATORS: [OperatorInfo; 4] = [
    info(Operator::Contains, "Contains"),
    info(Operator::NotContains, "Does not contain"),
    info(Operator::IsEmpty, "Is empty"),
    info(Operator::IsNotEmpty, "Is not empty"),
];

static SELECT_OPERATORS: [OperatorInfo; 4] = [
    info(Operator::Equals, "Is"),
    info(Operator::NotEquals, "Is not"),
    info(Operator::In, "Is any of"),
    info(Operator::NotIn, "Is none of"),
];

/// Ordered operators legal for a field type. The first entry is the default
/// operator offered when a condition is pointed at a field of that type.
pub fn operators_for_type(field_type: FieldType) -> &'static [OperatorInfo] {
    match field_type {
        FieldType::String => &STRING_OPERATORS,
        FieldType::Number => &NUMBER_OPERATORS,
        FieldType::Boolean => &BOOLEAN_OPERATORS,
        FieldType::Date => &DATE_OPERATORS,
        FieldType::Array => &ARRAY_OPERATORS,
        FieldType::Select => &SELECT_OPERATORS,
    }
}
