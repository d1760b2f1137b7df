//! Schedule repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist schedules, people, intervals and participation events.
//! - Return rows in the order the overlay engine relies on.
//!
//! # Invariants
//! - Intervals are append-only; nothing here updates or deletes them.
//! - `list_intervals` returns rows in insertion order (override priority).
//! - `list_events` returns rows ascending by `at`, insertion order for ties.
//! - Integrity failures (unknown schedule/person, CHECK violations) are
//!   returned as `RepoError::Db` without reinterpretation.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::interval::{Interval, IntervalKind, IntervalValidationError, Person, Span};
use crate::model::participation::{EventKind, ParticipationEvent};
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const INTERVAL_SELECT_SQL: &str = "SELECT
    schedule,
    person,
    kind,
    start_at,
    end_before
FROM intervals";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for schedule persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(IntervalValidationError),
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "schedule repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "schedule repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted schedule data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<IntervalValidationError> for RepoError {
    fn from(value: IntervalValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter for listing intervals of one kind that overlap a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalQuery {
    pub schedule: String,
    pub kind: IntervalKind,
    pub window: Span,
    /// Restricts rows to one person when set.
    pub person: Option<Person>,
}

impl IntervalQuery {
    pub fn new(schedule: impl Into<String>, kind: IntervalKind, window: Span) -> Self {
        Self {
            schedule: schedule.into(),
            kind,
            window,
            person: None,
        }
    }

    pub fn for_person(mut self, person: impl Into<Person>) -> Self {
        self.person = Some(person.into());
        self
    }
}

/// Persistence contract consumed by services and the rotation generator.
pub trait ScheduleRepository {
    fn add_schedule(&self, name: &str) -> RepoResult<()>;
    fn add_person(&self, name: &str) -> RepoResult<()>;
    /// Appends one interval. Performs no conflict checking.
    fn add_interval(&self, interval: &Interval) -> RepoResult<()>;
    /// Intervals overlapping `query.window`, in insertion order.
    fn list_intervals(&self, query: &IntervalQuery) -> RepoResult<Vec<Interval>>;
    /// Appends one participation event, registering the person if unknown.
    fn add_event(&self, event: &ParticipationEvent) -> RepoResult<()>;
    /// Events for one schedule ascending by `at`.
    fn list_events(&self, schedule: &str) -> RepoResult<Vec<ParticipationEvent>>;
}

impl<R: ScheduleRepository + ?Sized> ScheduleRepository for &R {
    fn add_schedule(&self, name: &str) -> RepoResult<()> {
        (**self).add_schedule(name)
    }

    fn add_person(&self, name: &str) -> RepoResult<()> {
        (**self).add_person(name)
    }

    fn add_interval(&self, interval: &Interval) -> RepoResult<()> {
        (**self).add_interval(interval)
    }

    fn list_intervals(&self, query: &IntervalQuery) -> RepoResult<Vec<Interval>> {
        (**self).list_intervals(query)
    }

    fn add_event(&self, event: &ParticipationEvent) -> RepoResult<()> {
        (**self).add_event(event)
    }

    fn list_events(&self, schedule: &str) -> RepoResult<Vec<ParticipationEvent>> {
        (**self).list_events(schedule)
    }
}

/// SQLite-backed schedule repository.
///
/// Works on a plain connection or, through deref, on an open transaction.
pub struct SqliteScheduleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScheduleRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ScheduleRepository for SqliteScheduleRepository<'_> {
    fn add_schedule(&self, name: &str) -> RepoResult<()> {
        self.conn
            .execute("INSERT INTO schedules (name) VALUES (?1);", [name])?;
        Ok(())
    }

    fn add_person(&self, name: &str) -> RepoResult<()> {
        self.conn
            .execute("INSERT INTO people (name) VALUES (?1);", [name])?;
        Ok(())
    }

    fn add_interval(&self, interval: &Interval) -> RepoResult<()> {
        interval.validate()?;

        self.conn.execute(
            "INSERT INTO intervals (
                schedule,
                person,
                kind,
                start_at,
                end_before
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                interval.schedule.as_str(),
                interval.person.as_str(),
                interval.kind.as_str(),
                interval.start.timestamp_millis(),
                interval.end.timestamp_millis(),
            ],
        )?;
        debug!(
            "event=interval_insert module=repo status=ok kind={} start_ms={} end_ms={}",
            interval.kind,
            interval.start.timestamp_millis(),
            interval.end.timestamp_millis()
        );

        Ok(())
    }

    fn list_intervals(&self, query: &IntervalQuery) -> RepoResult<Vec<Interval>> {
        let mut stmt = self.conn.prepare(&format!(
            "{INTERVAL_SELECT_SQL}
             WHERE schedule = ?1
               AND kind = ?2
               AND start_at < ?3
               AND end_before > ?4
               AND (?5 IS NULL OR person = ?5)
             ORDER BY id ASC;"
        ))?;

        let mut rows = stmt.query(params![
            query.schedule.as_str(),
            query.kind.as_str(),
            query.window.end.timestamp_millis(),
            query.window.start.timestamp_millis(),
            query.person.as_deref(),
        ])?;
        let mut intervals = Vec::new();

        while let Some(row) = rows.next()? {
            intervals.push(parse_interval_row(row)?);
        }

        Ok(intervals)
    }

    fn add_event(&self, event: &ParticipationEvent) -> RepoResult<()> {
        if event.person.trim().is_empty() {
            return Err(RepoError::Validation(IntervalValidationError::EmptyPerson));
        }

        self.conn.execute(
            "INSERT OR IGNORE INTO people (name) VALUES (?1);",
            [event.person.as_str()],
        )?;
        self.conn.execute(
            "INSERT INTO participation_events (
                schedule,
                person,
                kind,
                at
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                event.schedule.as_str(),
                event.person.as_str(),
                event.kind.as_str(),
                event.at.timestamp_millis(),
            ],
        )?;

        Ok(())
    }

    fn list_events(&self, schedule: &str) -> RepoResult<Vec<ParticipationEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT schedule, person, kind, at
             FROM participation_events
             WHERE schedule = ?1
             ORDER BY at ASC, id ASC;",
        )?;

        let mut rows = stmt.query([schedule])?;
        let mut events = Vec::new();

        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }

        Ok(events)
    }
}

fn parse_interval_row(row: &Row<'_>) -> RepoResult<Interval> {
    let kind_text: String = row.get("kind")?;
    let kind = kind_text.parse::<IntervalKind>().map_err(|_| {
        RepoError::InvalidData(format!("invalid interval kind `{kind_text}` in intervals.kind"))
    })?;

    let interval = Interval {
        schedule: row.get("schedule")?,
        person: row.get("person")?,
        kind,
        start: parse_instant(row.get("start_at")?, "intervals.start_at")?,
        end: parse_instant(row.get("end_before")?, "intervals.end_before")?,
    };
    interval.validate()?;
    Ok(interval)
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<ParticipationEvent> {
    let kind_text: String = row.get("kind")?;
    let kind = kind_text.parse::<EventKind>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid event kind `{kind_text}` in participation_events.kind"
        ))
    })?;

    Ok(ParticipationEvent {
        schedule: row.get("schedule")?,
        person: row.get("person")?,
        kind,
        at: parse_instant(row.get("at")?, "participation_events.at")?,
    })
}

fn parse_instant(millis: i64, column: &'static str) -> RepoResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        RepoError::InvalidData(format!("timestamp `{millis}` out of range in {column}"))
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["schedules", "people", "intervals", "participation_events"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
