#![allow(missing_docs)]

//! Duty fairness across groups.
//!
//! Each group's rate is its qualifying events divided by its eligible
//! members. The average is the plain mean of the group rates, so a small
//! unit weighs as much as a large one. Groups with no eligible members have
//! no defined rate; they report `0` and [`ZeroEligiblePolicy`] decides
//! whether that `0` takes part in the average.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FairnessConfig;
use crate::model::DutyAssignment;
use crate::query::ast::Group;
use crate::query::builder::GroupBuilder;
use crate::query::executor::execute;
use crate::query::operator::Operator;
use crate::record::Record;

/// Something that happened to a group, such as one duty shift.
pub trait QualifyingEvent {
    /// Group the event counts against.
    fn group_key(&self) -> &str;
}

impl<T: QualifyingEvent + ?Sized> QualifyingEvent for &T {
    fn group_key(&self) -> &str {
        (**self).group_key()
    }
}

impl QualifyingEvent for str {
    fn group_key(&self) -> &str {
        self
    }
}

impl QualifyingEvent for String {
    fn group_key(&self) -> &str {
        self
    }
}

impl QualifyingEvent for DutyAssignment {
    fn group_key(&self) -> &str {
        &self.unit_id
    }
}

/// Treatment of groups with no eligible members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroEligiblePolicy {
    /// Leave the group out of the average and the dispersion figures.
    #[default]
    Exclude,
    /// Count the group with a rate of `0`.
    ZeroFill,
}

/// Per-group line of a [`FairnessReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FairnessRow {
    pub group_id: String,
    pub total_eligible: usize,
    pub total_events: usize,
    /// Events per eligible member; `0` when nobody is eligible.
    pub per_capita: f64,
    /// `|per_capita - average|` for groups in the average, else `0`.
    pub deviation: f64,
    pub imbalanced: bool,
    /// `false` when the group had no eligible members.
    pub rate_defined: bool,
}

/// Cross-group fairness summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FairnessReport {
    /// One row per group, ordered by group id.
    pub rows: Vec<FairnessRow>,
    pub total_events: usize,
    pub total_eligible: usize,
    /// Mean of the per-capita rates of the groups in the average.
    pub average_per_capita: f64,
    /// Population variance of those rates.
    pub variance: f64,
    /// Largest deviation from the average.
    pub max_deviation: f64,
    pub imbalance_threshold: f64,
    pub zero_eligible: ZeroEligiblePolicy,
    /// Ids of rows flagged imbalanced, in row order.
    pub imbalanced_groups: Vec<String>,
}

impl FairnessReport {
    /// Looks up a group's row.
    pub fn row(&self, group_id: &str) -> Option<&FairnessRow> {
        self.rows.iter().find(|row| row.group_id == group_id)
    }
}

/// Computes per-group rates and their spread.
///
/// Groups come from both inputs: a group with events but no entry in
/// `eligibility` is treated as having no eligible members.
pub fn analyze_fairness<E: QualifyingEvent>(
    events: &[E],
    eligibility: &BTreeMap<String, usize>,
    config: &FairnessConfig,
) -> FairnessReport {
    let mut tallies: BTreeMap<&str, (usize, usize)> = eligibility
        .iter()
        .map(|(group, &eligible)| (group.as_str(), (eligible, 0)))
        .collect();
    for event in events {
        tallies.entry(event.group_key()).or_insert((0, 0)).1 += 1;
    }

    let mut rows: Vec<FairnessRow> = tallies
        .into_iter()
        .map(|(group, (eligible, events))| {
            let rate_defined = eligible > 0;
            if !rate_defined {
                debug!(group, events, "stats.fairness.zero_eligible");
            }
            FairnessRow {
                group_id: group.to_string(),
                total_eligible: eligible,
                total_events: events,
                per_capita: if rate_defined {
                    events as f64 / eligible as f64
                } else {
                    0.0
                },
                deviation: 0.0,
                imbalanced: false,
                rate_defined,
            }
        })
        .collect();

    let counted = |row: &FairnessRow| {
        row.rate_defined || config.zero_eligible == ZeroEligiblePolicy::ZeroFill
    };
    let rates: Vec<f64> = rows
        .iter()
        .filter(|row| counted(row))
        .map(|row| row.per_capita)
        .collect();
    let average = mean(&rates);
    let variance = mean(&rates.iter().map(|r| (r - average).powi(2)).collect::<Vec<_>>());

    let threshold = config.imbalance_threshold;
    let mut max_deviation: f64 = 0.0;
    for row in rows.iter_mut().filter(|row| counted(row)) {
        row.deviation = (row.per_capita - average).abs();
        row.imbalanced = row.deviation > threshold;
        max_deviation = max_deviation.max(row.deviation);
    }
    let imbalanced_groups: Vec<String> = rows
        .iter()
        .filter(|row| row.imbalanced)
        .map(|row| row.group_id.clone())
        .collect();

    let report = FairnessReport {
        total_events: rows.iter().map(|row| row.total_events).sum(),
        total_eligible: rows.iter().map(|row| row.total_eligible).sum(),
        rows,
        average_per_capita: average,
        variance,
        max_deviation,
        imbalance_threshold: threshold,
        zero_eligible: config.zero_eligible,
        imbalanced_groups,
    };
    debug!(
        groups = report.rows.len(),
        events = report.total_events,
        average = report.average_per_capita,
        imbalanced = report.imbalanced_groups.len(),
        "stats.fairness.completed"
    );
    report
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let value = values.iter().sum::<f64>() / values.len() as f64;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Members available for duty: `dutyStatus` is `Present for Duty`.
pub fn default_eligibility() -> Group {
    GroupBuilder::all()
        .condition("dutyStatus", Operator::Equals, "Present for Duty")
        .build()
}

/// Eligible members per group. Every group present in `records` gets an
/// entry, so groups where nobody qualifies show up with `0`.
pub fn eligibility_counts<R: Record>(
    records: &[R],
    group_key: &str,
    eligible: &Group,
) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = records
        .iter()
        .map(|record| (record.field(group_key).to_string(), 0))
        .collect();
    for record in execute(records, Some(eligible)) {
        *counts.entry(record.field(group_key).to_string()).or_default() += 1;
    }
    counts
}
