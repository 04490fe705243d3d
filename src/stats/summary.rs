#![allow(missing_docs)]

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::config::StatsConfig;
use crate::record::Record;
use crate::stats::distribution::{
    count_by, count_equal, count_truthy, mean, one_decimal, percent, sum_numbers, top_n,
    Distribution,
};

/// Headline numbers for a (possibly filtered) roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub total: usize,
    pub deployment_eligible_count: usize,
    pub deployment_eligible_percent: u32,
    pub medical_ready_count: usize,
    pub medical_ready_percent: u32,
    /// Mean years of service, one decimal place.
    pub avg_years_of_service: String,
    pub by_branch: Vec<Distribution>,
    /// Most common ranks, largest first.
    pub by_rank: Vec<Distribution>,
    pub by_clearance: Vec<Distribution>,
}

/// Summarizes `records` with default settings.
pub fn summarize<R: Record>(records: &[R]) -> StatisticsSummary {
    summarize_with(records, &StatsConfig::default())
}

/// Summarizes `records`. An empty slice yields zero counts, `"0.0"` and
/// empty distributions.
pub fn summarize_with<R: Record>(records: &[R], config: &StatsConfig) -> StatisticsSummary {
    let started = Instant::now();
    let total = records.len();
    let deployment_eligible_count = count_truthy(records, "deploymentEligible");
    let medical_ready_count = count_equal(records, "medicalReadiness", &config.ready_medical_status);
    let summary = StatisticsSummary {
        total,
        deployment_eligible_count,
        deployment_eligible_percent: percent(deployment_eligible_count, total),
        medical_ready_count,
        medical_ready_percent: percent(medical_ready_count, total),
        avg_years_of_service: one_decimal(mean(sum_numbers(records, "yearsOfService"), total)),
        by_branch: count_by(records, "branch"),
        by_rank: top_n(count_by(records, "rank"), config.top_n),
        by_clearance: count_by(records, "clearanceLevel"),
    };
    debug!(
        total,
        eligible = deployment_eligible_count,
        ready = medical_ready_count,
        duration_ms = started.elapsed().as_secs_f64() * 1000.0,
        "stats.summarize.completed"
    );
    summary
}
