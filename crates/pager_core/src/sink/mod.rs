//! Destinations for a schedule's resolved intervals.
//!
//! The paging platform's HTTP client lives outside this crate; anything
//! that can receive a schedule's intervals implements [`PagingSink`].

use crate::model::interval::Interval;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;

#[derive(Debug)]
pub enum SinkError {
    Io(std::io::Error),
}

impl Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "sink io error: {err}"),
        }
    }
}

impl Error for SinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SinkError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

pub trait PagingSink {
    /// Replaces what the destination knows about `schedule` with `intervals`.
    fn apply(&mut self, schedule: &str, intervals: &[Interval]) -> Result<(), SinkError>;
}

impl<S: PagingSink + ?Sized> PagingSink for &mut S {
    fn apply(&mut self, schedule: &str, intervals: &[Interval]) -> Result<(), SinkError> {
        (**self).apply(schedule, intervals)
    }
}

/// Text sink that dumps each interval on its own line.
pub struct WriterSink<W: Write> {
    out: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PagingSink for WriterSink<W> {
    fn apply(&mut self, schedule: &str, intervals: &[Interval]) -> Result<(), SinkError> {
        writeln!(self.out, "writing intervals for schedule {schedule:?}")?;
        for (i, interval) in intervals.iter().enumerate() {
            writeln!(self.out, "{i}: {interval}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}
