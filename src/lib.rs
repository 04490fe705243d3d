//! Muster: query, statistics and fairness engine for personnel rosters.
//!
//! The crate evaluates nested AND/OR condition trees against personnel
//! records, reduces the matching records to dashboard statistics, and
//! measures how evenly duty assignments are spread across units.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod data_generator;
pub mod error;
pub mod model;
pub mod query;
pub mod record;
pub mod stats;

pub use config::EngineConfig;
pub use error::{QueryError, Result};
pub use model::{DutyAssignment, Personnel, Unit, UnitHierarchy};
pub use query::{execute, Condition, Group, GroupBuilder, Logic, Operator, QueryExecutor};
pub use record::Record;
pub use stats::{analyze_fairness, summarize, FairnessReport, StatisticsSummary};
