//! Condition and group evaluation.
//!
//! Evaluation is total: every condition yields a boolean. Unknown fields and
//! operators that are not legal for the resolved field type match every
//! record, so saved queries that reference retired fields keep working.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::query::ast::{Condition, Group, Logic};
use crate::query::date;
use crate::query::field::{FieldRegistry, FieldType};
use crate::query::operator::Operator;
use crate::query::value::Value;
use crate::record::Record;

/// Outcome of `in` / `not_in` when the condition value is not a list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MembershipFallback {
    /// Neither operator matches.
    #[default]
    FailClosed,
    /// Both operators match.
    FailOpen,
}

/// Everything a condition needs beyond the record itself.
#[derive(Clone, Copy, Debug)]
pub struct EvalContext<'a> {
    registry: &'a FieldRegistry,
    today: Date,
    membership: MembershipFallback,
}

impl<'a> EvalContext<'a> {
    /// Context over `registry`, anchored at the current UTC date.
    pub fn new(registry: &'a FieldRegistry) -> Self {
        Self {
            registry,
            today: date::today_utc(),
            membership: MembershipFallback::default(),
        }
    }

    /// Overrides the date treated as "today" by relative date operators.
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = today;
        self
    }

    /// Overrides the `in` / `not_in` behaviour for non-list values.
    pub fn with_membership_fallback(mut self, membership: MembershipFallback) -> Self {
        self.membership = membership;
        self
    }

    /// Registry used to resolve field keys.
    pub fn registry(&self) -> &'a FieldRegistry {
        self.registry
    }

    /// The evaluation date.
    pub fn today(&self) -> Date {
        self.today
    }

    /// Evaluates a single condition against `record`.
    pub fn condition<R: Record + ?Sized>(&self, record: &R, condition: &Condition) -> bool {
        let Some(descriptor) = self.registry.get(&condition.field) else {
            return true;
        };
        let value = record.field(&condition.field);
        match descriptor.field_type {
            FieldType::String => eval_string(&value, condition),
            FieldType::Number => eval_number(&value, condition),
            FieldType::Boolean => eval_boolean(&value, condition),
            FieldType::Date => self.eval_date(&value, condition),
            FieldType::Array => eval_array(&value, condition),
            FieldType::Select => self.eval_select(&value, condition),
        }
    }

    /// Evaluates a group tree against `record`. An empty group matches.
    pub fn group<R: Record + ?Sized>(&self, record: &R, group: &Group) -> bool {
        if group.is_empty() {
            return true;
        }
        let mut results = group
            .conditions
            .iter()
            .map(|condition| self.condition(record, condition))
            .chain(group.groups.iter().map(|child| self.group(record, child)));
        match group.logic {
            Logic::And => results.all(|matched| matched),
            Logic::Or => results.any(|matched| matched),
        }
    }

    fn eval_date(&self, value: &Value, condition: &Condition) -> bool {
        let Some(field) = value_instant(value) else {
            return false;
        };
        let target = condition.value.as_ref().and_then(|v| v.to_instant());
        match condition.operator {
            Operator::Equals => target.is_some_and(|t| field.date() == t.date()),
            Operator::Before => target.is_some_and(|t| field < t),
            Operator::After => target.is_some_and(|t| field > t),
            Operator::Between => {
                let upper = condition
                    .second_value
                    .as_ref()
                    .and_then(|v| v.to_instant());
                match (target, upper) {
                    (Some(low), Some(high)) => field >= low && field <= high,
                    _ => false,
                }
            }
            Operator::InLastDays => {
                let today = date::midnight(self.today);
                let start = date::shift_instant(today, -window(condition));
                field >= start && field <= today
            }
            Operator::InNextDays => {
                let today = date::midnight(self.today);
                let end = date::shift_instant(today, window(condition));
                field >= today && field <= end
            }
            _ => true,
        }
    }

    fn eval_select(&self, value: &Value, condition: &Condition) -> bool {
        let field = value.to_string();
        let list = condition.value.as_ref().and_then(|v| v.as_list());
        let fallback = self.membership == MembershipFallback::FailOpen;
        match condition.operator {
            Operator::Equals => field == condition.value_text(),
            Operator::NotEquals => field != condition.value_text(),
            Operator::In => list.map_or(fallback, |options| options.contains(&field)),
            Operator::NotIn => list.map_or(fallback, |options| !options.contains(&field)),
            _ => true,
        }
    }
}

fn eval_string(value: &Value, condition: &Condition) -> bool {
    let field = value.to_text().to_lowercase();
    let target = condition.value_text().to_lowercase();
    match condition.operator {
        Operator::Equals => field == target,
        Operator::NotEquals => field != target,
        Operator::Contains => field.contains(&target),
        Operator::NotContains => !field.contains(&target),
        Operator::StartsWith => field.starts_with(&target),
        Operator::EndsWith => field.ends_with(&target),
        Operator::IsEmpty => field.is_empty(),
        Operator::IsNotEmpty => !field.is_empty(),
        _ => true,
    }
}

fn eval_number(value: &Value, condition: &Condition) -> bool {
    let field = value.to_number();
    let target = condition.value_number();
    match condition.operator {
        Operator::Equals => field == target,
        Operator::NotEquals => field != target,
        Operator::GreaterThan => field > target,
        Operator::LessThan => field < target,
        Operator::GreaterOrEqual => field >= target,
        Operator::LessOrEqual => field <= target,
        Operator::Between => field >= target && field <= condition.second_number(),
        _ => true,
    }
}

fn eval_boolean(value: &Value, condition: &Condition) -> bool {
    let field = value.truthy();
    match condition.operator {
        Operator::IsTrue => field,
        Operator::IsFalse => !field,
        _ => true,
    }
}

fn eval_array(value: &Value, condition: &Condition) -> bool {
    let items = value.as_list();
    let needle = condition.value_text().to_lowercase();
    let contains = || {
        items
            .iter()
            .any(|item| item.to_lowercase().contains(&needle))
    };
    match condition.operator {
        Operator::Contains => contains(),
        Operator::NotContains => !contains(),
        Operator::IsEmpty => items.is_empty(),
        Operator::IsNotEmpty => !items.is_empty(),
        _ => true,
    }
}

fn value_instant(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::Date(d) => Some(date::midnight(*d)),
        Value::String(raw) => date::parse_instant(raw),
        Value::Number(millis) if *millis != 0.0 => date::from_epoch_millis(*millis),
        _ => None,
    }
}

// Whole days; fractional counts truncate toward zero.
fn window(condition: &Condition) -> Duration {
    let days = condition.value_number().trunc();
    let days = days.clamp(-1_000_000.0, 1_000_000.0) as i64;
    Duration::days(days)
}

/// Evaluates `condition` against `record` using the personnel registry and
/// today's date.
pub fn evaluate_condition<R: Record + ?Sized>(record: &R, condition: &Condition) -> bool {
    EvalContext::new(FieldRegistry::personnel()).condition(record, condition)
}

/// Evaluates `group` against `record` using the personnel registry and
/// today's date.
pub fn evaluate_group<R: Record + ?Sized>(record: &R, group: &Group) -> bool {
    EvalContext::new(FieldRegistry::personnel()).group(record, group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::ConditionValue;
    use serde_json::json;
    use time::macros::date;

    fn ctx() -> EvalContext<'static> {
        EvalContext::new(FieldRegistry::personnel()).with_today(date!(2024 - 06 - 15))
    }

    #[test]
    fn unknown_field_matches_everything() {
        let condition = Condition::new("c1", "doesNotExist", "equals", "x");
        assert!(ctx().condition(&json!({}), &condition));
        assert!(ctx().condition(&json!({"doesNotExist": "y"}), &condition));
    }

    #[test]
    fn operator_illegal_for_type_matches() {
        let condition = Condition::new("c1", "lastName", Operator::GreaterThan, "a");
        assert!(ctx().condition(&json!({"lastName": "Smith"}), &condition));
        let condition = Condition::new("c1", "lastName", "regex", "a");
        assert!(ctx().condition(&json!({"lastName": "Smith"}), &condition));
    }

    #[test]
    fn string_operators_ignore_case() {
        let record = json!({"lastName": "McAllister"});
        let check = |op: &str, value: &str| {
            ctx().condition(&record, &Condition::new("c", "lastName", op, value))
        };
        assert!(check("equals", "mcallister"));
        assert!(!check("not_equals", "MCALLISTER"));
        assert!(check("starts_with", "MC"));
        assert!(check("ends_with", "Ster"));
        assert!(check("not_contains", "jones"));
        assert!(!ctx().condition(
            &record,
            &Condition::unary("c", "lastName", Operator::IsEmpty)
        ));
        assert!(ctx().condition(
            &json!({"lastName": null}),
            &Condition::unary("c", "lastName", Operator::IsEmpty)
        ));
    }

    #[test]
    fn number_coercion_treats_garbage_as_zero() {
        let condition = Condition::new("c", "ptTestScore", "equals", 0);
        assert!(ctx().condition(&json!({"ptTestScore": "n/a"}), &condition));
        assert!(ctx().condition(&json!({}), &condition));
        let condition = Condition::new("c", "ptTestScore", "less_than", "abc");
        assert!(!ctx().condition(&json!({"ptTestScore": 10}), &condition));
        let condition = Condition::new("c", "ptTestScore", "greater_or_equal", "250");
        assert!(ctx().condition(&json!({"ptTestScore": "250"}), &condition));
    }

    #[test]
    fn boolean_uses_truthiness() {
        let is_true = Condition::unary("c", "deploymentEligible", Operator::IsTrue);
        assert!(ctx().condition(&json!({"deploymentEligible": true}), &is_true));
        assert!(ctx().condition(&json!({"deploymentEligible": "yes"}), &is_true));
        assert!(!ctx().condition(&json!({"deploymentEligible": 0}), &is_true));
        assert!(!ctx().condition(&json!({}), &is_true));
        let equals = Condition::new("c", "deploymentEligible", "equals", true);
        assert!(ctx().condition(&json!({"deploymentEligible": false}), &equals));
    }

    #[test]
    fn date_comparisons() {
        let record = json!({"lastPhysical": "2024-03-10"});
        let check = |condition: Condition| ctx().condition(&record, &condition);
        assert!(check(Condition::new("c", "lastPhysical", "equals", "2024-03-10T18:30:00Z")));
        assert!(!check(Condition::new("c", "lastPhysical", "equals", "2024-03-11")));
        assert!(check(Condition::new("c", "lastPhysical", "before", "2024-03-11")));
        assert!(!check(Condition::new("c", "lastPhysical", "before", "2024-03-10")));
        assert!(check(Condition::new("c", "lastPhysical", "after", "2024-03-09")));
        assert!(check(Condition::between("c", "lastPhysical", "2024-03-10", "2024-03-10")));
        assert!(!check(Condition::new("c", "lastPhysical", "between", "2024-03-01")));
        assert!(!check(Condition::new("c", "lastPhysical", "before", "garbage")));
    }

    #[test]
    fn missing_field_date_never_matches() {
        let record = json!({"lastPhysical": ""});
        for op in ["equals", "before", "after", "in_last_days", "unknown_op"] {
            let condition = Condition::new("c", "lastPhysical", op, "2024-01-01");
            assert!(!ctx().condition(&record, &condition), "{op}");
        }
    }

    #[test]
    fn relative_day_windows_are_inclusive() {
        let last_30 = Condition::new("c", "clearanceExpiration", "in_last_days", 30);
        let next_30 = Condition::new("c", "clearanceExpiration", "in_next_days", 30);
        let on = |d: &str| json!({ "clearanceExpiration": d });
        assert!(ctx().condition(&on("2024-05-16"), &last_30));
        assert!(ctx().condition(&on("2024-06-15"), &last_30));
        assert!(!ctx().condition(&on("2024-05-15"), &last_30));
        assert!(!ctx().condition(&on("2024-06-16"), &last_30));
        assert!(ctx().condition(&on("2024-06-15"), &next_30));
        assert!(ctx().condition(&on("2024-07-15"), &next_30));
        assert!(!ctx().condition(&on("2024-07-16"), &next_30));
        assert!(!ctx().condition(&on("2024-06-14"), &next_30));
    }

    #[test]
    fn out_of_range_dates_do_not_panic() {
        let huge = Condition::new("c", "clearanceExpiration", "before", 1e35);
        assert!(!ctx().condition(&json!({"clearanceExpiration": "2024-06-15"}), &huge));
        let before = Condition::new("c", "clearanceExpiration", "before", "2024-06-15");
        assert!(!ctx().condition(&json!({"clearanceExpiration": 1e35}), &before));

        let last_day = EvalContext::new(FieldRegistry::personnel()).with_today(Date::MAX);
        let next = Condition::new("c", "clearanceExpiration", "in_next_days", 1);
        assert!(last_day.condition(&json!({"clearanceExpiration": "9999-12-31"}), &next));
        assert!(!last_day.condition(&json!({"clearanceExpiration": "9999-12-30"}), &next));

        let first_day = EvalContext::new(FieldRegistry::personnel()).with_today(Date::MIN);
        let last = Condition::new("c", "clearanceExpiration", "in_last_days", 1_000_000);
        assert!(!first_day.condition(&json!({"clearanceExpiration": "2000-01-01"}), &last));
    }

    #[test]
    fn array_membership_is_substring_and_case_insensitive() {
        let record = json!({"trainingCompleted": ["Airborne School", "Combat Lifesaver"]});
        let contains = Condition::new("c", "trainingCompleted", "contains", "lifesaver");
        assert!(ctx().condition(&record, &contains));
        let not_contains = Condition::new("c", "trainingCompleted", "not_contains", "ranger");
        assert!(ctx().condition(&record, &not_contains));
        let empty = Condition::unary("c", "trainingCompleted", Operator::IsEmpty);
        assert!(ctx().condition(&json!({"trainingCompleted": "Airborne"}), &empty));
        assert!(!ctx().condition(&record, &empty));
    }

    #[test]
    fn select_membership_requires_a_list() {
        let record = json!({"branch": "Navy"});
        let within = Condition::new("c", "branch", "in", vec!["Army", "Navy"]);
        let outside = Condition::new("c", "branch", "not_in", vec!["Army", "Navy"]);
        assert!(ctx().condition(&record, &within));
        assert!(!ctx().condition(&record, &outside));

        let scalar_in = Condition::new("c", "branch", "in", "Navy");
        let scalar_not_in = Condition::new("c", "branch", "not_in", "Army");
        assert!(!ctx().condition(&record, &scalar_in));
        assert!(!ctx().condition(&record, &scalar_not_in));

        let open = ctx().with_membership_fallback(MembershipFallback::FailOpen);
        assert!(open.condition(&record, &scalar_in));
        assert!(open.condition(&record, &scalar_not_in));
    }

    #[test]
    fn select_equality_is_exact() {
        let record = json!({"clearanceLevel": "Top Secret"});
        assert!(ctx().condition(
            &record,
            &Condition::new("c", "clearanceLevel", "equals", "Top Secret")
        ));
        assert!(!ctx().condition(
            &record,
            &Condition::new("c", "clearanceLevel", "equals", "top secret")
        ));
        assert!(ctx().condition(
            &record,
            &Condition {
                value: Some(ConditionValue::Text("Secret".into())),
                ..Condition::unary("c", "clearanceLevel", Operator::NotEquals)
            }
        ));
    }

    #[test]
    fn group_logic_and_nesting() {
        let record = json!({"branch": "Marines", "clearanceLevel": "Secret"});
        let mut group = Group::new("g", Logic::And);
        assert!(ctx().group(&record, &group));
        group.conditions.push(Condition::new("c1", "branch", "equals", "Marines"));
        let mut inner = Group::new("g2", Logic::Or);
        inner
            .conditions
            .push(Condition::new("c2", "clearanceLevel", "equals", "Top Secret"));
        group.groups.push(inner.clone());
        assert!(!ctx().group(&record, &group));
        group.groups[0]
            .conditions
            .push(Condition::new("c3", "clearanceLevel", "equals", "Secret"));
        assert!(ctx().group(&record, &group));

        // an empty sub-group counts as a matching child
        let mut only_empty = Group::new("g", Logic::Or);
        only_empty.groups.push(Group::new("g2", Logic::And));
        assert!(ctx().group(&record, &only_empty));
    }
}
