//! Rotation boundary functions.

use crate::error::{PagerError, PagerResult};
use crate::model::interval::{format_instant, Span};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::America::New_York;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Maps an instant to the next rotation transition.
pub type BoundaryFn = fn(DateTime<Utc>) -> PagerResult<DateTime<Utc>>;

/// Supported generation cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Hand off Monday noon and Friday noon, America/New_York local time.
    MondayAndFridayAtNoonEastern,
}

impl Style {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MondayAndFridayAtNoonEastern => "MondayAndFridayAtNoonEastern",
        }
    }

    pub fn boundary_fn(self) -> BoundaryFn {
        match self {
            Self::MondayAndFridayAtNoonEastern => monday_and_friday_at_noon_eastern,
        }
    }
}

impl Display for Style {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = PagerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MondayAndFridayAtNoonEastern" => Ok(Self::MondayAndFridayAtNoonEastern),
            other => Err(PagerError::UnsupportedStyle(other.to_string())),
        }
    }
}

/// Next Monday-noon or Friday-noon (Eastern) transition after `t`.
///
/// An instant before noon on a Monday or Friday maps to that same noon;
/// noon itself maps to the following transition.
pub fn monday_and_friday_at_noon_eastern(t: DateTime<Utc>) -> PagerResult<DateTime<Utc>> {
    let local = t.with_timezone(&New_York);
    let today = local.date_naive();
    let before_noon_today = t < noon_eastern(today)?;

    let days_ahead = match local.weekday() {
        Weekday::Sun => 1,
        Weekday::Mon if before_noon_today => 0,
        Weekday::Mon => 4,
        Weekday::Tue => 3,
        Weekday::Wed => 2,
        Weekday::Thu => 1,
        Weekday::Fri if before_noon_today => 0,
        Weekday::Fri => 3,
        Weekday::Sat => 2,
    };

    let day = today.checked_add_days(Days::new(days_ahead)).ok_or_else(|| {
        PagerError::InvariantViolation(format!("date overflow after {}", format_instant(t)))
    })?;
    noon_eastern(day)
}

fn noon_eastern(day: NaiveDate) -> PagerResult<DateTime<Utc>> {
    let noon = day.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
    New_York
        .from_local_datetime(&noon)
        .single()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| {
            PagerError::InvariantViolation(format!("noon on {day} is not a unique Eastern instant"))
        })
}

/// Splits `window` into consecutive segments at the boundaries of `next`.
///
/// The last segment is clamped to `window.end`.
///
/// # Errors
/// Returns `InvariantViolation` when `next` does not move strictly forward.
pub fn segments(window: Span, next: BoundaryFn) -> PagerResult<Vec<Span>> {
    window.validate()?;

    let mut out = Vec::new();
    let mut a = window.start;
    while a < window.end {
        let b = checked_next(a, next)?;
        let b = b.min(window.end);
        out.push(Span { start: a, end: b });
        a = b;
    }
    Ok(out)
}

fn checked_next(a: DateTime<Utc>, next: BoundaryFn) -> PagerResult<DateTime<Utc>> {
    let b = next(a)?;
    if b <= a {
        return Err(PagerError::InvariantViolation(format!(
            "boundary {} does not advance past {}",
            format_instant(b),
            format_instant(a)
        )));
    }
    Ok(b)
}
