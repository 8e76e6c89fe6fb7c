//! Account age estimation from a creation (or earliest activity) timestamp.
//!
//! Years are 365 days and months are 30 days. The figures are an
//! approximation and are rendered exactly that way so output stays stable
//! across deployments.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Placeholder used for every field the upstream did not provide
pub const NOT_AVAILABLE: &str = "N/A";

const MILLIS_PER_DAY: i64 = 1000 * 60 * 60 * 24;
const DAYS_PER_YEAR: i64 = 365;
const DAYS_PER_MONTH: i64 = 30;

/// Derived age figures attached to a normalized profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeEstimate {
    pub estimated_creation_date: String,
    pub account_age: String,
    pub age_days: i64,
}

impl AgeEstimate {
    /// No timestamp available
    pub fn unknown() -> Self {
        Self {
            estimated_creation_date: NOT_AVAILABLE.to_string(),
            account_age: NOT_AVAILABLE.to_string(),
            age_days: 0,
        }
    }

    /// Estimate from a real account creation time.
    pub fn from_creation(created: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let days = age_days(created, now);
        Self {
            estimated_creation_date: localized_date(created),
            account_age: format_account_age(days),
            age_days: days,
        }
    }

    /// Estimate from the earliest observed activity.
    ///
    /// `age_days` uses the exact timestamp while the human-readable age is
    /// counted from the start of the displayed calendar day.
    pub fn from_earliest_activity(observed: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let day_start = observed.date_naive().and_time(NaiveTime::MIN).and_utc();
        Self {
            estimated_creation_date: localized_date(observed),
            account_age: format_account_age(age_days(day_start, now)),
            age_days: age_days(observed, now),
        }
    }

    /// Estimate from an optional raw upstream timestamp, falling back to
    /// [`AgeEstimate::unknown`] when it is absent or unparseable.
    pub fn from_raw_creation(raw: Option<&str>, now: DateTime<Utc>) -> Self {
        raw.and_then(parse_timestamp)
            .map(|created| Self::from_creation(created, now))
            .unwrap_or_else(Self::unknown)
    }
}

/// Parse the timestamp shapes the Graph APIs emit: RFC 3339,
/// `2012-05-01T12:34:56+0000`, or a bare `YYYY-MM-DD` date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Whole days elapsed between `created` and `now`, floored, never negative.
pub fn age_days(created: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let diff_ms = (now - created).num_milliseconds();
    diff_ms.div_euclid(MILLIS_PER_DAY).max(0)
}

/// `"<Y> years, <M> months"` when at least a year old, `"<M> months"` otherwise.
pub fn format_account_age(age_days: i64) -> String {
    let years = age_days / DAYS_PER_YEAR;
    let months = (age_days % DAYS_PER_YEAR) / DAYS_PER_MONTH;
    if years > 0 {
        format!("{years} years, {months} months")
    } else {
        format!("{months} months")
    }
}

/// en-US short date (`M/D/YYYY`), rendered in UTC
pub fn localized_date(dt: DateTime<Utc>) -> String {
    dt.format("%-m/%-d/%Y").to_string()
}
