//! Fluent construction and in-place editing of condition trees.

use std::collections::HashSet;

use crate::query::ast::{Condition, ConditionValue, Group, Logic};
use crate::query::field::FieldRegistry;
use crate::query::operator::{operators_for_type, Operator};

/// Fluent builder producing a [`Group`] with generated ids.
///
/// Groups are numbered `g1, g2, ...` and conditions `c1, c2, ...` in
/// depth-first order, so two builders describing the same tree produce
/// identical groups.
#[derive(Clone, Debug, Default)]
pub struct GroupBuilder {
    logic: Logic,
    conditions: Vec<PendingCondition>,
    groups: Vec<GroupBuilder>,
}

#[derive(Clone, Debug)]
struct PendingCondition {
    field: String,
    operator: Operator,
    value: Option<ConditionValue>,
    second_value: Option<ConditionValue>,
}

impl GroupBuilder {
    /// Creates an empty builder with the given logic.
    pub fn new(logic: Logic) -> Self {
        Self {
            logic,
            conditions: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Builder whose children must all match.
    pub fn all() -> Self {
        Self::new(Logic::And)
    }

    /// Builder where any child may match.
    pub fn any() -> Self {
        Self::new(Logic::Or)
    }

    /// Adds `field <op> value`.
    pub fn condition(
        mut self,
        field: impl Into<String>,
        operator: impl Into<Operator>,
        value: impl Into<ConditionValue>,
    ) -> Self {
        self.conditions.push(PendingCondition {
            field: field.into(),
            operator: operator.into(),
            value: Some(value.into()),
            second_value: None,
        });
        self
    }

    /// Adds a condition whose operator takes no value (`is_true`, `is_empty`, ...).
    pub fn unary(mut self, field: impl Into<String>, operator: impl Into<Operator>) -> Self {
        self.conditions.push(PendingCondition {
            field: field.into(),
            operator: operator.into(),
            value: None,
            second_value: None,
        });
        self
    }

    /// Adds an inclusive `between` condition.
    pub fn between(
        mut self,
        field: impl Into<String>,
        low: impl Into<ConditionValue>,
        high: impl Into<ConditionValue>,
    ) -> Self {
        self.conditions.push(PendingCondition {
            field: field.into(),
            operator: Operator::Between,
            value: Some(low.into()),
            second_value: Some(high.into()),
        });
        self
    }

    /// Adds an `in` condition over the given options.
    pub fn one_of<I, S>(self, field: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        self.condition(field, Operator::In, options)
    }

    /// Adds a `not_in` condition over the given options.
    pub fn none_of<I, S>(self, field: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        self.condition(field, Operator::NotIn, options)
    }

    /// Nests a sub-group.
    pub fn group(mut self, child: GroupBuilder) -> Self {
        self.groups.push(child);
        self
    }

    /// Finishes the tree.
    pub fn build(self) -> Group {
        let mut next_group = 0usize;
        let mut next_condition = 0usize;
        self.build_node(&mut next_group, &mut next_condition)
    }

    fn build_node(self, next_group: &mut usize, next_condition: &mut usize) -> Group {
        *next_group += 1;
        let mut group = Group::new(format!("g{next_group}"), self.logic);
        for pending in self.conditions {
            *next_condition += 1;
            group.conditions.push(Condition {
                id: format!("c{next_condition}"),
                field: pending.field,
                operator: pending.operator,
                value: pending.value,
                second_value: pending.second_value,
            });
        }
        for child in self.groups {
            group.groups.push(child.build_node(next_group, next_condition));
        }
        group
    }
}

impl Condition {
    /// Points the condition at another field. The operator resets to the first
    /// operator legal for the new field's type and both values are cleared;
    /// an unknown field falls back to `equals`.
    pub fn retarget(&mut self, field: impl Into<String>, registry: &FieldRegistry) {
        let field = field.into();
        self.operator = registry
            .get(&field)
            .and_then(|descriptor| operators_for_type(descriptor.field_type).first())
            .map(|info| info.operator.clone())
            .unwrap_or(Operator::Equals);
        self.field = field;
        self.value = None;
        self.second_value = None;
    }
}

impl Group {
    /// Finds a group anywhere in the tree, including the root.
    pub fn find_group(&self, id: &str) -> Option<&Group> {
        if self.id == id {
            return Some(self);
        }
        self.groups.iter().find_map(|child| child.find_group(id))
    }

    /// Mutable variant of [`Group::find_group`].
    pub fn find_group_mut(&mut self, id: &str) -> Option<&mut Group> {
        if self.id == id {
            return Some(self);
        }
        self.groups
            .iter_mut()
            .find_map(|child| child.find_group_mut(id))
    }

    /// Finds a condition anywhere in the tree.
    pub fn find_condition(&self, id: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|condition| condition.id == id)
            .or_else(|| self.groups.iter().find_map(|child| child.find_condition(id)))
    }

    fn find_condition_mut(&mut self, id: &str) -> Option<&mut Condition> {
        if let Some(pos) = self.conditions.iter().position(|c| c.id == id) {
            return Some(&mut self.conditions[pos]);
        }
        self.groups
            .iter_mut()
            .find_map(|child| child.find_condition_mut(id))
    }

    /// Appends `condition` to the group `group_id`. The condition keeps its id
    /// unless that id is empty or already used in the tree, in which case a
    /// fresh one is assigned. Returns the id used, or `None` if the group does
    /// not exist.
    pub fn add_condition(&mut self, group_id: &str, mut condition: Condition) -> Option<String> {
        self.find_group(group_id)?;
        let ids = self.collect_ids();
        if condition.id.is_empty() || ids.contains(&condition.id) {
            condition.id = fresh_id(&ids, "c");
        }
        let id = condition.id.clone();
        self.find_group_mut(group_id)?.conditions.push(condition);
        Some(id)
    }

    /// Appends a blank condition on `field`, preset to the field's default
    /// operator, as the interactive builder does when a row is added.
    pub fn add_default_condition(
        &mut self,
        group_id: &str,
        field: &str,
        registry: &FieldRegistry,
    ) -> Option<String> {
        let mut condition = Condition::unary(String::new(), field, Operator::Equals);
        condition.retarget(field, registry);
        self.add_condition(group_id, condition)
    }

    /// Removes a condition anywhere in the tree.
    pub fn remove_condition(&mut self, id: &str) -> Option<Condition> {
        if let Some(pos) = self.conditions.iter().position(|c| c.id == id) {
            return Some(self.conditions.remove(pos));
        }
        self.groups
            .iter_mut()
            .find_map(|child| child.remove_condition(id))
    }

    /// Applies `edit` to a condition. Returns `false` if the id is unknown.
    pub fn update_condition(&mut self, id: &str, edit: impl FnOnce(&mut Condition)) -> bool {
        match self.find_condition_mut(id) {
            Some(condition) => {
                edit(condition);
                true
            }
            None => false,
        }
    }

    /// Adds an empty sub-group under `parent_id`. Returns the new group's id.
    pub fn add_group(&mut self, parent_id: &str, logic: Logic) -> Option<String> {
        self.find_group(parent_id)?;
        let id = fresh_id(&self.collect_ids(), "g");
        self.find_group_mut(parent_id)?
            .groups
            .push(Group::new(id.clone(), logic));
        Some(id)
    }

    /// Removes a sub-group and everything below it. The root itself cannot be
    /// removed.
    pub fn remove_group(&mut self, id: &str) -> Option<Group> {
        if let Some(pos) = self.groups.iter().position(|g| g.id == id) {
            return Some(self.groups.remove(pos));
        }
        self.groups
            .iter_mut()
            .find_map(|child| child.remove_group(id))
    }

    /// Switches a group between AND and OR.
    pub fn set_logic(&mut self, id: &str, logic: Logic) -> bool {
        match self.find_group_mut(id) {
            Some(group) => {
                group.logic = logic;
                true
            }
            None => false,
        }
    }

    fn collect_ids(&self) -> HashSet<String> {
        let mut ids = HashSet::new();
        self.collect_ids_into(&mut ids);
        ids
    }

    fn collect_ids_into(&self, ids: &mut HashSet<String>) {
        ids.insert(self.id.clone());
        ids.extend(self.conditions.iter().map(|c| c.id.clone()));
        for child in &self.groups {
            child.collect_ids_into(ids);
        }
    }
}

fn fresh_id(taken: &HashSet<String>, prefix: &str) -> String {
    (taken.len() + 1..)
        .map(|n| format!("{prefix}{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| format!("{prefix}0"))
}
