//! Strict-mode validation.
//!
//! The evaluator is deliberately permissive. This pass reports everything it
//! would have papered over so callers that prefer rejection over silent
//! matching can opt in.

use thiserror::Error;

use crate::query::ast::{Condition, Group};
use crate::query::field::{FieldDescriptor, FieldRegistry, FieldType};
use crate::query::operator::Operator;

/// Default nesting limit applied in strict mode.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// A single problem found in a condition tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryIssue {
    /// The condition names a field missing from the registry.
    #[error("condition '{condition}' references unknown field '{field}'")]
    UnknownField {
        /// Offending condition id.
        condition: String,
        /// The unresolved key.
        field: String,
    },
    /// The operator is not legal for the field's type.
    #[error("condition '{condition}': operator '{operator}' is not valid for {field_type} field '{field}'")]
    OperatorNotAllowed {
        /// Offending condition id.
        condition: String,
        /// Field key.
        field: String,
        /// Operator name as written.
        operator: String,
        /// Resolved field type.
        field_type: FieldType,
    },
    /// The operator needs a value but none was given.
    #[error("condition '{condition}': operator '{operator}' requires a value")]
    MissingValue {
        /// Offending condition id.
        condition: String,
        /// Operator name.
        operator: String,
    },
    /// `between` without an upper bound.
    #[error("condition '{condition}': between requires secondValue")]
    MissingSecondValue {
        /// Offending condition id.
        condition: String,
    },
    /// `in` / `not_in` with a scalar value.
    #[error("condition '{condition}': operator '{operator}' requires a list value")]
    ExpectedList {
        /// Offending condition id.
        condition: String,
        /// Operator name.
        operator: String,
    },
    /// A select literal outside the field's option set.
    #[error("condition '{condition}': '{value}' is not an option of '{field}'")]
    UnknownOption {
        /// Offending condition id.
        condition: String,
        /// Field key.
        field: String,
        /// The rejected literal.
        value: String,
    },
    /// A number literal that coerces to zero because it does not parse.
    #[error("condition '{condition}': '{value}' is not a number")]
    InvalidNumber {
        /// Offending condition id.
        condition: String,
        /// The rejected literal.
        value: String,
    },
    /// A date literal that cannot be parsed.
    #[error("condition '{condition}': '{value}' is not a date")]
    InvalidDate {
        /// Offending condition id.
        condition: String,
        /// The rejected literal.
        value: String,
    },
    /// The tree nests deeper than allowed.
    #[error("group '{group}' nests {depth} levels deep (limit {max})")]
    TooDeep {
        /// Root id of the offending tree.
        group: String,
        /// Observed depth.
        depth: usize,
        /// Configured limit.
        max: usize,
    },
}

impl QueryIssue {
    /// Returns a machine-readable code for the issue.
    pub fn code(&self) -> &'static str {
        match self {
            QueryIssue::UnknownField { .. } => "UnknownField",
            QueryIssue::OperatorNotAllowed { .. } => "OperatorNotAllowed",
            QueryIssue::MissingValue { .. } => "MissingValue",
            QueryIssue::MissingSecondValue { .. } => "MissingSecondValue",
            QueryIssue::ExpectedList { .. } => "ExpectedList",
            QueryIssue::UnknownOption { .. } => "UnknownOption",
            QueryIssue::InvalidNumber { .. } => "InvalidNumber",
            QueryIssue::InvalidDate { .. } => "InvalidDate",
            QueryIssue::TooDeep { .. } => "TooDeep",
        }
    }

    /// Id of the condition at fault, if the issue concerns one condition.
    pub fn condition(&self) -> Option<&str> {
        match self {
            QueryIssue::UnknownField { condition, .. }
            | QueryIssue::OperatorNotAllowed { condition, .. }
            | QueryIssue::MissingValue { condition, .. }
            | QueryIssue::MissingSecondValue { condition }
            | QueryIssue::ExpectedList { condition, .. }
            | QueryIssue::UnknownOption { condition, .. }
            | QueryIssue::InvalidNumber { condition, .. }
            | QueryIssue::InvalidDate { condition, .. } => Some(condition),
            QueryIssue::TooDeep { .. } => None,
        }
    }
}

/// Checks `group` against `registry`, returning every issue in tree order.
/// An empty result means the evaluator will not need to fail open anywhere.
pub fn validate(group: &Group, registry: &FieldRegistry, max_depth: usize) -> Vec<QueryIssue> {
    let mut issues = Vec::new();
    let depth = group.depth();
    if depth > max_depth {
        issues.push(QueryIssue::TooDeep {
            group: group.id.clone(),
            depth,
            max: max_depth,
        });
    }
    group.walk_conditions(&mut |condition| check_condition(condition, registry, &mut issues));
    issues
}

fn check_condition(condition: &Condition, registry: &FieldRegistry, issues: &mut Vec<QueryIssue>) {
    let id = || condition.id.clone();
    let Some(descriptor) = registry.get(&condition.field) else {
        issues.push(QueryIssue::UnknownField {
            condition: id(),
            field: condition.field.clone(),
        });
        return;
    };
    let operator = &condition.operator;
    if !operator.is_allowed_for(descriptor.field_type) {
        issues.push(QueryIssue::OperatorNotAllowed {
            condition: id(),
            field: condition.field.clone(),
            operator: operator.to_string(),
            field_type: descriptor.field_type,
        });
        return;
    }
    if !operator.takes_value() {
        return;
    }
    let Some(value) = condition.value.as_ref() else {
        issues.push(QueryIssue::MissingValue {
            condition: id(),
            operator: operator.to_string(),
        });
        return;
    };
    if operator.takes_list() {
        match value.as_list() {
            Some(options) => check_options(condition, descriptor, options, issues),
            None => issues.push(QueryIssue::ExpectedList {
                condition: id(),
                operator: operator.to_string(),
            }),
        }
        return;
    }
    if operator.takes_second_value() && condition.second_value.is_none() {
        issues.push(QueryIssue::MissingSecondValue { condition: id() });
    }

    let literals = std::iter::once(value).chain(condition.second_value.as_ref());
    match descriptor.field_type {
        FieldType::Number => {
            for literal in literals.filter(|literal| !literal.is_numeric()) {
                issues.push(QueryIssue::InvalidNumber {
                    condition: id(),
                    value: literal.to_string(),
                });
            }
        }
        // relative windows take a day count, not a date
        FieldType::Date if matches!(operator, Operator::InLastDays | Operator::InNextDays) => {
            if !value.is_numeric() {
                issues.push(QueryIssue::InvalidNumber {
                    condition: id(),
                    value: value.to_string(),
                });
            }
        }
        FieldType::Date => {
            for literal in literals.filter(|literal| literal.to_instant().is_none()) {
                issues.push(QueryIssue::InvalidDate {
                    condition: id(),
                    value: literal.to_string(),
                });
            }
        }
        FieldType::Select => {
            check_options(
                condition,
                descriptor,
                std::slice::from_ref(&value.to_string()),
                issues,
            );
        }
        FieldType::String | FieldType::Boolean | FieldType::Array => {}
    }
}

fn check_options(
    condition: &Condition,
    descriptor: &FieldDescriptor,
    values: &[String],
    issues: &mut Vec<QueryIssue>,
) {
    if descriptor.options.is_empty() {
        return;
    }
    for value in values {
        if !descriptor.options.contains(&value.as_str()) {
            issues.push(QueryIssue::UnknownOption {
                condition: condition.id.clone(),
                field: condition.field.clone(),
                value: value.clone(),
            });
        }
    }
}
