//! Date handling for date-typed fields.
//!
//! Dates travel as ISO `YYYY-MM-DD` strings. A bare date is interpreted as
//! midnight UTC so that date-only and timestamped values order consistently.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime};

use crate::error::{QueryError, Result};

/// Parses an ISO `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Parses a calendar date, reporting the rejected input on failure.
pub fn parse_date_arg(raw: &str) -> Result<Date> {
    parse_date(raw).ok_or_else(|| QueryError::invalid_date(raw))
}

/// Parses a date or timestamp into an instant.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, and offset-less
/// `YYYY-MM-DDTHH:MM:SS` timestamps (read as UTC).
pub fn parse_instant(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(date) = parse_date(raw) {
        return Some(midnight(date));
    }
    if let Ok(instant) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(instant);
    }
    PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .ok()
    .map(PrimitiveDateTime::assume_utc)
}

/// Converts milliseconds since the Unix epoch into an instant.
pub fn from_epoch_millis(millis: f64) -> Option<OffsetDateTime> {
    if !millis.is_finite() {
        return None;
    }
    let nanos = (millis.trunc() as i128).checked_mul(1_000_000)?;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

/// Moves `instant` by `offset`, saturating at the ends of the calendar.
pub fn shift_instant(instant: OffsetDateTime, offset: Duration) -> OffsetDateTime {
    instant.checked_add(offset).unwrap_or_else(|| {
        if offset.is_negative() {
            PrimitiveDateTime::MIN.assume_utc()
        } else {
            PrimitiveDateTime::MAX.assume_utc()
        }
    })
}

/// Midnight UTC at the start of `date`.
pub fn midnight(date: Date) -> OffsetDateTime {
    date.midnight().assume_utc()
}

/// Milliseconds since the Unix epoch at midnight UTC of `date`.
pub fn epoch_millis(date: Date) -> i64 {
    (midnight(date).unix_timestamp_nanos() / 1_000_000) as i64
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_iso(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Current UTC calendar date.
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Shifts `date` by a signed number of whole days, saturating at the
/// representable range.
pub fn shift_days(date: Date, days: i64) -> Date {
    let shifted = if days >= 0 {
        date.checked_add(Duration::days(days))
    } else {
        date.checked_sub(Duration::days(days.saturating_neg()))
    };
    shifted.unwrap_or(if days >= 0 { Date::MAX } else { Date::MIN })
}

/// Serde adapter storing a [`Date`] as an ISO string.
pub mod iso {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::Date;

    /// Serializes `date` as `YYYY-MM-DD`.
    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_iso(*date))
    }

    /// Deserializes a `YYYY-MM-DD` string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date literal '{raw}'")))
    }
}
