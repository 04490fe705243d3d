//! Serializable condition tree.
//!
//! A [`Group`] exclusively owns its conditions and sub-groups; there is no
//! sharing between trees, so cloning a group duplicates the whole subtree.
//! The JSON shape matches what the dashboard persists for saved views:
//!
//! ```json
//! {"id": "g1", "logic": "AND",
//!  "conditions": [{"id": "c1", "field": "branch", "operator": "equals", "value": "Marines"}],
//!  "groups": []}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::query::date;
use crate::query::operator::Operator;
use crate::query::value::parse_number;

/// How a group combines its children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    /// Every child must match.
    #[default]
    And,
    /// At least one child must match.
    Or,
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::And => f.write_str("AND"),
            Logic::Or => f.write_str("OR"),
        }
    }
}

/// Literal supplied by a condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Number(f64),
    /// Text literal; dates are written as ISO text.
    Text(String),
    /// Option list for `in` / `not_in`.
    List(Vec<String>),
}

impl ConditionValue {
    /// Numeric coercion; non-numeric text becomes `0`.
    pub fn to_number(&self) -> f64 {
        match self {
            ConditionValue::Bool(v) => f64::from(u8::from(*v)),
            ConditionValue::Number(v) if v.is_finite() => *v,
            ConditionValue::Number(_) => 0.0,
            ConditionValue::Text(v) => parse_number(v),
            ConditionValue::List(items) => match items.as_slice() {
                [single] => parse_number(single),
                _ => 0.0,
            },
        }
    }

    /// Instant named by the literal, if it reads as a date or timestamp.
    /// Numbers are taken as milliseconds since the Unix epoch.
    pub fn to_instant(&self) -> Option<OffsetDateTime> {
        match self {
            ConditionValue::Text(v) => date::parse_instant(v),
            ConditionValue::Number(v) => date::from_epoch_millis(*v),
            ConditionValue::Bool(_) | ConditionValue::List(_) => None,
        }
    }

    /// Borrows the option list when the literal is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ConditionValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` when the literal parses as a number.
    pub fn is_numeric(&self) -> bool {
        match self {
            ConditionValue::Number(v) => v.is_finite(),
            ConditionValue::Text(v) => v.trim().parse::<f64>().is_ok_and(f64::is_finite),
            ConditionValue::Bool(_) | ConditionValue::List(_) => false,
        }
    }
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Bool(v) => write!(f, "{v}"),
            ConditionValue::Number(v) => write!(f, "{v}"),
            ConditionValue::Text(v) => f.write_str(v),
            ConditionValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::Text(value.to_owned())
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        ConditionValue::Text(value)
    }
}

impl From<f64> for ConditionValue {
    fn from(value: f64) -> Self {
        ConditionValue::Number(value)
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        ConditionValue::Number(value as f64)
    }
}

impl From<i32> for ConditionValue {
    fn from(value: i32) -> Self {
        ConditionValue::Number(f64::from(value))
    }
}

impl From<bool> for ConditionValue {
    fn from(value: bool) -> Self {
        ConditionValue::Bool(value)
    }
}

impl From<Vec<String>> for ConditionValue {
    fn from(value: Vec<String>) -> Self {
        ConditionValue::List(value)
    }
}

impl From<Vec<&str>> for ConditionValue {
    fn from(value: Vec<&str>) -> Self {
        ConditionValue::List(value.into_iter().map(str::to_owned).collect())
    }
}

/// Leaf predicate: `field <operator> value [secondValue]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Identifier unique within the tree.
    pub id: String,
    /// Field key resolved through the field registry.
    pub field: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Primary literal. Absent for unary operators such as `is_empty`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ConditionValue>,
    /// Upper bound for `between`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_value: Option<ConditionValue>,
}

impl Condition {
    /// Creates a condition with a primary value.
    pub fn new(
        id: impl Into<String>,
        field: impl Into<String>,
        operator: impl Into<Operator>,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            operator: operator.into(),
            value: Some(value.into()),
            second_value: None,
        }
    }

    /// Creates a condition for an operator that takes no value.
    pub fn unary(
        id: impl Into<String>,
        field: impl Into<String>,
        operator: impl Into<Operator>,
    ) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            operator: operator.into(),
            value: None,
            second_value: None,
        }
    }

    /// Creates an inclusive `between` condition.
    pub fn between(
        id: impl Into<String>,
        field: impl Into<String>,
        low: impl Into<ConditionValue>,
        high: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            operator: Operator::Between,
            value: Some(low.into()),
            second_value: Some(high.into()),
        }
    }

    /// Text form of the primary value; an absent value reads as `""`.
    pub fn value_text(&self) -> String {
        self.value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Numeric form of the primary value; absent reads as `0`.
    pub fn value_number(&self) -> f64 {
        self.value.as_ref().map_or(0.0, ConditionValue::to_number)
    }

    /// Numeric form of the upper bound; absent reads as `0`.
    pub fn second_number(&self) -> f64 {
        self.second_value
            .as_ref()
            .map_or(0.0, ConditionValue::to_number)
    }
}

/// Tree node combining conditions and nested groups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Identifier unique within the tree.
    pub id: String,
    /// Combination logic for the direct children.
    #[serde(default)]
    pub logic: Logic,
    /// Direct leaf predicates.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Direct sub-groups.
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Group {
    /// Creates an empty group.
    pub fn new(id: impl Into<String>, logic: Logic) -> Self {
        Self {
            id: id.into(),
            logic,
            conditions: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Shallow emptiness: no direct conditions and no direct sub-groups.
    /// A group holding only empty sub-groups is not empty by this check.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.groups.is_empty()
    }

    /// Number of conditions in the whole tree.
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
            + self
                .groups
                .iter()
                .map(Group::condition_count)
                .sum::<usize>()
    }

    /// Nesting depth; a lone root has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.groups.iter().map(Group::depth).max().unwrap_or(0)
    }

    /// Visits every condition in tree order (own conditions before
    /// sub-groups).
    pub fn walk_conditions<'a>(&'a self, visit: &mut dyn FnMut(&'a Condition)) {
        for condition in &self.conditions {
            visit(condition);
        }
        for group in &self.groups {
            group.walk_conditions(visit);
        }
    }
}

/// Named query as persisted by the saved-views store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedQuery {
    /// Display name.
    pub name: String,
    /// Optional free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The condition tree.
    pub group: Group,
}
