//! Error taxonomy shared by services, the rotation generator and callers.
//!
//! # Responsibility
//! - Give every failure mode a typed variant that callers can match on.
//! - Keep storage errors intact so integrity violations surface unchanged.
//!
//! # Invariants
//! - Invariant violations are reported through `PagerError::InvariantViolation`,
//!   never through a panic.

use crate::db::DbError;
use crate::interchange::InterchangeError;
use crate::model::interval::{Interval, IntervalValidationError, Person, Span};
use crate::repo::schedule_repo::RepoError;
use crate::sink::SinkError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PagerResult<T> = Result<T, PagerError>;

#[derive(Debug)]
pub enum PagerError {
    /// Malformed interval or identifier, rejected before the engine runs.
    Validation(IntervalValidationError),
    /// Generation style is not one this build knows.
    UnsupportedStyle(String),
    /// A new interval overlaps an opposite-kind interval for the same person.
    Conflict {
        candidate: Interval,
        existing: Interval,
    },
    /// Nobody is on the roster for a rotation segment.
    NoAvailablePerson { span: Span },
    /// An exclusion needs covering but nobody else is on the roster.
    NotEnoughPeople { person: Person, span: Span },
    /// Internal contract broken, e.g. a boundary that does not advance.
    InvariantViolation(String),
    Repo(RepoError),
    Interchange(InterchangeError),
    Sink(SinkError),
}

impl PagerError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl Display for PagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UnsupportedStyle(style) => write!(f, "unhandled style {style:?}"),
            Self::Conflict {
                candidate,
                existing,
            } => write!(
                f,
                "conflict: {} for {:?} conflicts with existing {} over {}",
                candidate.kind,
                candidate.person,
                existing.kind,
                existing.span()
            ),
            Self::NoAvailablePerson { span } => {
                write!(f, "nobody available to take shift {span}")
            }
            Self::NotEnoughPeople { person, span } => {
                write!(f, "nobody available to cover {person:?} during exclusion {span}")
            }
            Self::InvariantViolation(message) => write!(f, "invariant violation: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Interchange(err) => write!(f, "{err}"),
            Self::Sink(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PagerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Interchange(err) => Some(err),
            Self::Sink(err) => Some(err),
            Self::UnsupportedStyle(_)
            | Self::Conflict { .. }
            | Self::NoAvailablePerson { .. }
            | Self::NotEnoughPeople { .. }
            | Self::InvariantViolation(_) => None,
        }
    }
}

impl From<IntervalValidationError> for PagerError {
    fn from(value: IntervalValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for PagerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for PagerError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for PagerError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(DbError::Sqlite(value)))
    }
}

impl From<InterchangeError> for PagerError {
    fn from(value: InterchangeError) -> Self {
        Self::Interchange(value)
    }
}

impl From<SinkError> for PagerError {
    fn from(value: SinkError) -> Self {
        Self::Sink(value)
    }
}
