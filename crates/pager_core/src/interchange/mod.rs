//! Interval interchange formats.
//!
//! # Responsibility
//! - Encode a timeline for display and decode user-supplied intervals.
//!
//! # Invariants
//! - Timestamps are RFC3339; intervals are half-open `[start_at, end_before)`.

use crate::model::interval::IntervalValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod csv;

pub use self::csv::{read_csv, write_csv, CSV_HEADER};

#[derive(Debug)]
pub enum InterchangeError {
    Csv(::csv::Error),
    Io(std::io::Error),
    /// A data row did not carry exactly three fields.
    FieldCount { line: u64, found: usize },
    InvalidTimestamp { line: u64, value: String },
    InvalidInterval {
        line: u64,
        source: IntervalValidationError,
    },
}

impl Display for InterchangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "csv error: {err}"),
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::FieldCount { line, found } => {
                write!(f, "line {line}: expected 3 fields, found {found}")
            }
            Self::InvalidTimestamp { line, value } => {
                write!(f, "line {line}: invalid RFC3339 timestamp `{value}`")
            }
            Self::InvalidInterval { line, source } => write!(f, "line {line}: {source}"),
        }
    }
}

impl Error for InterchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::InvalidInterval { source, .. } => Some(source),
            Self::FieldCount { .. } | Self::InvalidTimestamp { .. } => None,
        }
    }
}

impl From<::csv::Error> for InterchangeError {
    fn from(value: ::csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<std::io::Error> for InterchangeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
