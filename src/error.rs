use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::query::analyze::QueryIssue;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Errors raised at the crate's I/O, parsing and strict-validation
/// boundaries.
///
/// Evaluating a query never produces one of these in the default
/// (fail-open) mode; they only surface when callers load data, load
/// configuration, or opt into strict validation.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Strict validation rejected the query tree.
    #[error("query rejected with {} issue(s): {}", issues.len(), summarize_issues(issues))]
    InvalidQuery {
        /// Every problem found, in tree order.
        issues: Vec<QueryIssue>,
    },
    /// JSON payload could not be decoded or encoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// I/O error while reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A date argument was not an ISO `YYYY-MM-DD` date.
    #[error("invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },
    /// A unit id was not present in the unit hierarchy.
    #[error("unknown unit '{unit}'")]
    UnknownUnit {
        /// The unit id that failed to resolve.
        unit: String,
    },
}

impl QueryError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidQuery { .. } => "InvalidQuery",
            QueryError::Json(_) => "Json",
            QueryError::Io(_) => "Io",
            QueryError::Config(_) => "Config",
            QueryError::InvalidDate { .. } => "InvalidDate",
            QueryError::UnknownUnit { .. } => "UnknownUnit",
        }
    }

    pub(crate) fn invalid_date(value: impl Into<String>) -> Self {
        QueryError::InvalidDate {
            value: value.into(),
        }
    }
}

fn summarize_issues(issues: &[QueryIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
