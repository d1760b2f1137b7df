//! Runs one parsed command inside one transaction.

use crate::cli::{balance, Command};
use pager_core::{
    open_db, with_transaction, write_csv, GenerateRequest, Interval, PagerError, PagerResult,
    ScheduleService, SqliteScheduleRepository, WriterSink,
};
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

#[derive(Debug)]
pub enum CliError {
    /// Malformed `--start`/`--end`/`--for` combination.
    Window(String),
    Io(io::Error),
    Pager(PagerError),
}

impl CliError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Pager(err) if err.is_conflict())
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Window(message) => write!(f, "invalid time window: {message}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Pager(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<PagerError> for CliError {
    fn from(value: PagerError) -> Self {
        Self::Pager(value)
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddSchedule { .. } => "add-schedule",
            Self::AddPerson { .. } => "add-person",
            Self::AddInterval { .. } => "add-interval",
            Self::ShowSchedule { .. } => "show-schedule",
            Self::Edit { .. } => "edit",
            Self::Generate { .. } => "generate",
            Self::Apply { .. } => "apply",
        }
    }
}

pub fn run(command: &Command, db: &Path) -> Result<(), CliError> {
    let mut conn = open_db(db).map_err(PagerError::from)?;

    match command {
        Command::AddSchedule { name } => in_tx(&mut conn, |svc| svc.add_schedule(name))?,
        Command::AddPerson { who } => in_tx(&mut conn, |svc| svc.add_person(who))?,
        Command::AddInterval {
            schedule,
            who,
            kind,
            window,
        } => {
            let span = window.span().map_err(CliError::Window)?;
            let interval = Interval {
                schedule: schedule.clone(),
                person: who.clone(),
                kind: *kind,
                start: span.start,
                end: span.end,
            };
            in_tx(&mut conn, |svc| svc.add_interval(&interval))?;
        }
        Command::ShowSchedule { schedule, window } => {
            let span = window.span().map_err(CliError::Window)?;
            let timeline = in_tx(&mut conn, |svc| svc.show_schedule(schedule, span))?;
            print_csv(&timeline)?;
        }
        Command::Edit {
            schedule, actions, ..
        } => {
            in_tx(&mut conn, |svc| svc.edit_participation(schedule, actions))?;
        }
        Command::Generate {
            schedule,
            style,
            window,
            balances,
        } => {
            let span = window.span().map_err(CliError::Window)?;
            let request =
                GenerateRequest::new(schedule.as_str(), *style, span).with_balance(balance(balances));
            let outcome = in_tx(&mut conn, |svc| svc.generate(&request))?;
            print_csv(&outcome.inserted)?;
        }
        Command::Apply { schedule, file } => {
            let input: Box<dyn Read> = match file {
                Some(path) => Box::new(File::open(path)?),
                None => Box::new(io::stdin().lock()),
            };
            let mut sink = WriterSink::new(io::stdout().lock());
            in_tx(&mut conn, |svc| svc.apply(input, &mut sink, schedule))?;
        }
    }
    Ok(())
}

fn in_tx<T>(
    conn: &mut Connection,
    body: impl FnOnce(&ScheduleService<SqliteScheduleRepository<'_>>) -> PagerResult<T>,
) -> PagerResult<T> {
    with_transaction(conn, |tx| {
        let repo = SqliteScheduleRepository::try_new(tx)?;
        body(&ScheduleService::new(repo))
    })
}

fn print_csv(intervals: &[Interval]) -> Result<(), CliError> {
    write_csv(io::stdout().lock(), intervals).map_err(PagerError::from)?;
    Ok(())
}
