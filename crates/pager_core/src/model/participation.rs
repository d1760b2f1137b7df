//! Participation roster events.
//!
//! # Invariants
//! - A person is available at `t` iff their latest event with `at <= t` is `Add`.
//! - Events sharing `(person, at)` keep the order in which they were supplied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use super::interval::{format_instant, Person};

/// Roster mutation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Add,
    Remove,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Remove => "REMOVE",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ADD" => Ok(Self::Add),
            "REMOVE" => Ok(Self::Remove),
            other => Err(format!("unknown participation event kind `{other}`")),
        }
    }
}

/// One roster change for one person on one schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationEvent {
    pub schedule: String,
    pub person: Person,
    pub kind: EventKind,
    pub at: DateTime<Utc>,
}

impl ParticipationEvent {
    pub fn add(schedule: impl Into<String>, person: impl Into<Person>, at: DateTime<Utc>) -> Self {
        Self {
            schedule: schedule.into(),
            person: person.into(),
            kind: EventKind::Add,
            at,
        }
    }

    pub fn remove(
        schedule: impl Into<String>,
        person: impl Into<Person>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            schedule: schedule.into(),
            person: person.into(),
            kind: EventKind::Remove,
            at,
        }
    }
}

impl Display for ParticipationEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({:?}) in {:?} at {}",
            self.kind,
            self.person,
            self.schedule,
            format_instant(self.at)
        )
    }
}
