//! Query executor.
//!
//! `execute` is the permissive entry point: it never fails and never
//! reorders. [`QueryExecutor`] carries the evaluation clock and registry, and
//! can optionally validate the tree first (strict mode).

use std::time::Instant;

use time::Date;
use tracing::{debug, trace, warn};

use crate::config::QueryConfig;
use crate::error::{QueryError, Result};
use crate::query::analyze::{validate, QueryIssue, DEFAULT_MAX_DEPTH};
use crate::query::ast::Group;
use crate::query::date;
use crate::query::evaluator::{EvalContext, MembershipFallback};
use crate::query::field::FieldRegistry;
use crate::record::Record;

/// Filters `records` by `group`, preserving order.
///
/// A missing group, or one with no direct conditions and no direct
/// sub-groups, returns every record.
pub fn execute<'r, R: Record>(records: &'r [R], group: Option<&Group>) -> Vec<&'r R> {
    QueryExecutor::new().filter(records, group)
}

/// Owned variant of [`execute`].
pub fn execute_owned<R: Record + Clone>(records: &[R], group: Option<&Group>) -> Vec<R> {
    execute(records, group).into_iter().cloned().collect()
}

/// Configurable executor.
#[derive(Clone, Debug)]
pub struct QueryExecutor<'a> {
    registry: &'a FieldRegistry,
    today: Date,
    strict: bool,
    max_depth: usize,
    membership: MembershipFallback,
}

impl Default for QueryExecutor<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryExecutor<'static> {
    /// Permissive executor over the personnel registry, dated today.
    pub fn new() -> Self {
        Self::with_registry(FieldRegistry::personnel())
    }

    /// Executor configured from the `[query]` config section.
    pub fn from_config(config: &QueryConfig) -> Self {
        Self::new()
            .strict(config.strict)
            .max_depth(config.max_depth)
            .membership_fallback(config.membership_fallback)
    }
}

impl<'a> QueryExecutor<'a> {
    /// Permissive executor over a custom registry.
    pub fn with_registry(registry: &'a FieldRegistry) -> Self {
        Self {
            registry,
            today: date::today_utc(),
            strict: false,
            max_depth: DEFAULT_MAX_DEPTH,
            membership: MembershipFallback::default(),
        }
    }

    /// Sets the date relative operators count from.
    pub fn today(mut self, today: Date) -> Self {
        self.today = today;
        self
    }

    /// Enables or disables validation before evaluation.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Nesting limit enforced in strict mode.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Behaviour of `in` / `not_in` with a non-list value.
    pub fn membership_fallback(mut self, membership: MembershipFallback) -> Self {
        self.membership = membership;
        self
    }

    /// Evaluation context matching this executor's settings.
    pub fn context(&self) -> EvalContext<'a> {
        EvalContext::new(self.registry)
            .with_today(self.today)
            .with_membership_fallback(self.membership)
    }

    /// Issues strict mode would reject `group` for.
    pub fn validate(&self, group: &Group) -> Vec<QueryIssue> {
        validate(group, self.registry, self.max_depth)
    }

    /// Returns `true` if `record` matches `group`.
    pub fn matches<R: Record + ?Sized>(&self, record: &R, group: &Group) -> bool {
        self.context().group(record, group)
    }

    /// Runs `group` over `records`. Only strict mode can fail.
    pub fn execute<'r, R: Record>(
        &self,
        records: &'r [R],
        group: Option<&Group>,
    ) -> Result<Vec<&'r R>> {
        if self.strict {
            if let Some(group) = group {
                let issues = self.validate(group);
                if !issues.is_empty() {
                    warn!(
                        group = %group.id,
                        issues = issues.len(),
                        first = %issues[0],
                        "query.validate.rejected"
                    );
                    return Err(QueryError::InvalidQuery { issues });
                }
            }
        }
        Ok(self.filter(records, group))
    }

    /// Runs `group` over `records` without validation.
    pub fn filter<'r, R: Record>(&self, records: &'r [R], group: Option<&Group>) -> Vec<&'r R> {
        let group = match group {
            Some(group) if !group.is_empty() => group,
            _ => {
                trace!(input = records.len(), "query.execute.skipped_empty");
                return records.iter().collect();
            }
        };
        let started = Instant::now();
        let ctx = self.context();
        let matched: Vec<&R> = records
            .iter()
            .filter(|record| ctx.group(*record, group))
            .collect();
        debug!(
            group = %group.id,
            input = records.len(),
            matched = matched.len(),
            conditions = group.condition_count(),
            depth = group.depth(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "query.execute.completed"
        );
        matched
    }
}
