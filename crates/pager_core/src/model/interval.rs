//! Interval domain model.
//!
//! # Responsibility
//! - Define the SHIFT/EXCLUSION record stored per schedule and person.
//! - Validate the half-open span invariant before anything else sees it.
//!
//! # Invariants
//! - `start < end`; `start` is inclusive, `end` is exclusive.
//! - `schedule` and `person` are non-blank opaque identifiers.
//! - Interval endpoints carry whole milliseconds, matching storage.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Opaque identifier of someone who can hold shifts.
pub type Person = String;

/// Interval category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntervalKind {
    /// Someone holds on-call responsibility.
    Shift,
    /// Someone is guaranteed not to be scheduled.
    Exclusion,
}

impl IntervalKind {
    /// Stable storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shift => "SHIFT",
            Self::Exclusion => "EXCLUSION",
        }
    }

    /// The kind that conflicts with this one for the same person.
    pub fn opposite(self) -> Self {
        match self {
            Self::Shift => Self::Exclusion,
            Self::Exclusion => Self::Shift,
        }
    }
}

impl Display for IntervalKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalKind {
    type Err = IntervalValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SHIFT" => Ok(Self::Shift),
            "EXCLUSION" => Ok(Self::Exclusion),
            _ => Err(IntervalValidationError::UnknownKind(value.to_string())),
        }
    }
}

/// Validation failures for interval input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalValidationError {
    /// `start` is not strictly before `end`.
    InvalidSpan {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    EmptyPerson,
    EmptySchedule,
    UnknownKind(String),
    /// Storage keeps whole milliseconds.
    SubMillisecond(DateTime<Utc>),
}

impl Display for IntervalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSpan { start, end } => write!(
                f,
                "invalid interval: start {} is not before end {}",
                format_instant(*start),
                format_instant(*end)
            ),
            Self::EmptyPerson => write!(f, "person must not be blank"),
            Self::EmptySchedule => write!(f, "schedule must not be blank"),
            Self::UnknownKind(value) => {
                write!(f, "unknown interval kind `{value}`; expected SHIFT|EXCLUSION")
            }
            Self::SubMillisecond(at) => write!(
                f,
                "timestamp {} is finer than one millisecond",
                at.to_rfc3339_opts(SecondsFormat::Nanos, true)
            ),
        }
    }
}

impl Error for IntervalValidationError {}

/// A half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Span {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, IntervalValidationError> {
        let span = Self { start, end };
        span.validate()?;
        Ok(span)
    }

    pub fn validate(&self) -> Result<(), IntervalValidationError> {
        if self.start < self.end {
            Ok(())
        } else {
            Err(IntervalValidationError::InvalidSpan {
                start: self.start,
                end: self.end,
            })
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Half-open overlap test. Touching spans do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.end > other.start && other.end > self.start
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            format_instant(self.start),
            format_instant(self.end)
        )
    }
}

/// One SHIFT or EXCLUSION for one person on one schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub schedule: String,
    pub person: Person,
    pub kind: IntervalKind,
    /// Inclusive.
    pub start: DateTime<Utc>,
    /// Exclusive.
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Creates a validated interval.
    pub fn new(
        schedule: impl Into<String>,
        person: impl Into<Person>,
        kind: IntervalKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, IntervalValidationError> {
        let interval = Self {
            schedule: schedule.into(),
            person: person.into(),
            kind,
            start,
            end,
        };
        interval.validate()?;
        Ok(interval)
    }

    /// Checks identifier and span invariants.
    pub fn validate(&self) -> Result<(), IntervalValidationError> {
        if self.schedule.trim().is_empty() {
            return Err(IntervalValidationError::EmptySchedule);
        }
        if self.person.trim().is_empty() {
            return Err(IntervalValidationError::EmptyPerson);
        }
        for at in [self.start, self.end] {
            if at.timestamp_subsec_nanos() % 1_000_000 != 0 {
                return Err(IntervalValidationError::SubMillisecond(at));
            }
        }
        self.span().validate()
    }

    pub fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.span().overlaps(&other.span())
    }

    /// Copy of this interval over a different span.
    pub fn with_span(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            ..self.clone()
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} for {:?} in {:?} {}",
            self.kind,
            self.person,
            self.schedule,
            self.span()
        )
    }
}

/// RFC3339 rendering used in messages and interchange.
pub fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
