//! Categorical counting and the numeric helpers shared by every report.

use std::collections::HashMap;

use serde::Serialize;
use time::Date;

use crate::query::date;
use crate::query::value::Value;
use crate::record::Record;

/// One bar of a categorical chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    /// Category value.
    pub name: String,
    /// Number of records in the category.
    pub value: usize,
    /// Display color, for categories with a fixed palette.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

impl Distribution {
    fn new(name: impl Into<String>, value: usize) -> Self {
        Self {
            name: name.into(),
            value,
            color: None,
        }
    }
}

/// Groups records by the display form of `key`, largest category first
/// (ties by name).
pub fn count_by<R: Record>(records: &[R], key: &str) -> Vec<Distribution> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.field(key).to_string()).or_default() += 1;
    }
    sorted(counts)
}

/// Counts records per option of a fixed option set, keeping the option order
/// and skipping options nobody holds. `palette` pairs an option with its color.
pub fn count_by_options<R: Record>(
    records: &[R],
    key: &str,
    options: &[&'static str],
    palette: &[(&'static str, &'static str)],
) -> Vec<Distribution> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.field(key).to_string()).or_default() += 1;
    }
    options
        .iter()
        .filter_map(|&option| {
            let value = counts.get(option).copied().filter(|&n| n > 0)?;
            let color = palette
                .iter()
                .find(|(name, _)| *name == option)
                .map(|&(_, color)| color);
            Some(Distribution {
                name: option.to_string(),
                value,
                color,
            })
        })
        .collect()
}

/// Counts list items across records, e.g. courses completed.
pub fn count_list_items<R: Record>(records: &[R], key: &str) -> Vec<Distribution> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        for item in record.field(key).as_list() {
            *counts.entry(item.clone()).or_default() += 1;
        }
    }
    sorted(counts)
}

fn sorted(counts: HashMap<String, usize>) -> Vec<Distribution> {
    let mut out: Vec<Distribution> = counts
        .into_iter()
        .map(|(name, value)| Distribution::new(name, value))
        .collect();
    out.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    out
}

/// Keeps the `n` largest entries of an already sorted distribution.
pub fn top_n(mut distribution: Vec<Distribution>, n: usize) -> Vec<Distribution> {
    distribution.truncate(n);
    distribution
}

/// `round(100 * count / total)`, or `0` for an empty population.
pub fn percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * count as f64 / total as f64).round() as u32
}

/// Arithmetic mean, or `0` for an empty population.
pub fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 || !sum.is_finite() {
        return 0.0;
    }
    sum / count as f64
}

/// Fixed-point text with one decimal place. Ties round away from zero.
pub fn one_decimal(value: f64) -> String {
    if !value.is_finite() {
        return "0.0".to_string();
    }
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

/// Number of records whose `key` is truthy.
pub fn count_truthy<R: Record>(records: &[R], key: &str) -> usize {
    records.iter().filter(|r| r.field(key).truthy()).count()
}

/// Number of records whose `key` displays as exactly `expected`.
pub fn count_equal<R: Record>(records: &[R], key: &str, expected: &str) -> usize {
    records
        .iter()
        .filter(|r| r.field(key).to_string() == expected)
        .count()
}

/// Sum of the numeric coercions of `key`.
pub fn sum_numbers<R: Record>(records: &[R], key: &str) -> f64 {
    records.iter().map(|r| r.field(key).to_number()).sum()
}

/// Calendar date held by `key`, if it reads as one.
pub fn field_date<R: Record + ?Sized>(record: &R, key: &str) -> Option<Date> {
    match record.field(key) {
        Value::Date(d) => Some(d),
        Value::String(raw) => date::parse_instant(&raw).map(|instant| instant.date()),
        Value::Number(millis) if millis != 0.0 => {
            date::from_epoch_millis(millis).map(|instant| instant.date())
        }
        _ => None,
    }
}
