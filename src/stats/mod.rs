//! Aggregations over record collections.
//!
//! Everything here is a pure reduction: records in, plain serializable data
//! out. Empty inputs produce zeros rather than `NaN`.

pub mod distribution;
pub mod fairness;
pub mod reports;

/// Headline statistics.
pub mod summary;

pub use distribution::Distribution;
pub use fairness::{
    analyze_fairness, default_eligibility, eligibility_counts, FairnessReport, FairnessRow,
    QualifyingEvent, ZeroEligiblePolicy,
};
pub use reports::SectionReports;
pub use summary::{summarize, summarize_with, StatisticsSummary};
