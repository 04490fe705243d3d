#![forbid(unsafe_code)]

//! Ad-hoc query engine.
//!
//! This module provides the field catalog, the boolean condition-tree
//! representation, and the evaluator/executor pair that filters record
//! collections by such a tree.

/// Strict-mode validation of condition trees.
///
/// Reports unresolved fields, illegal operators and malformed values that
/// the evaluator would otherwise silently treat as matching.
pub mod analyze;

/// Serializable condition tree.
///
/// Defines conditions, groups and their plain-JSON wire shape.
pub mod ast;

/// Fluent builder and in-place editing for condition trees.
pub mod builder;

/// Date parsing and the evaluation clock.
pub mod date;

/// Leaf and group evaluation against a single record.
pub mod evaluator;

/// Public entry point that filters record collections.
pub mod executor;

/// Static catalog of queryable fields.
pub mod field;

/// Comparison operators and their per-type availability.
pub mod operator;

/// Runtime field values and their coercion rules.
pub mod value;

pub use ast::{Condition, ConditionValue, Group, Logic, SavedQuery};
pub use builder::GroupBuilder;
pub use evaluator::{EvalContext, MembershipFallback};
pub use executor::{execute, execute_owned, QueryExecutor};
pub use field::{FieldDescriptor, FieldRegistry, FieldType};
pub use operator::{operators_for_type, Operator, OperatorInfo};
pub use value::Value;
