use super::InterchangeError;
use crate::model::interval::{format_instant, Interval, IntervalKind};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

pub const CSV_HEADER: [&str; 3] = ["start_at", "end_before", "person"];

#[derive(Serialize)]
struct OutRow<'a> {
    start_at: String,
    end_before: String,
    person: &'a str,
}

#[derive(Deserialize)]
struct InRow {
    start_at: String,
    end_before: String,
    person: String,
}

/// Writes `intervals` as `start_at,end_before,person` rows under a header.
pub fn write_csv<W: Write>(writer: W, intervals: &[Interval]) -> Result<(), InterchangeError> {
    let mut out = WriterBuilder::new().has_headers(false).from_writer(writer);
    out.write_record(CSV_HEADER)?;
    for interval in intervals {
        out.serialize(OutRow {
            start_at: format_instant(interval.start),
            end_before: format_instant(interval.end),
            person: interval.person.as_str(),
        })?;
    }
    out.flush()?;
    Ok(())
}

/// Reads intervals of `kind` for `schedule`.
///
/// A leading `start_at` header row is optional. Lines starting with `#` are
/// comments. Fields are taken verbatim, so padded person ids survive a
/// write/read cycle.
pub fn read_csv<R: Read>(
    reader: R,
    schedule: &str,
    kind: IntervalKind,
) -> Result<Vec<Interval>, InterchangeError> {
    let mut rows = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut out = Vec::new();
    let mut record = StringRecord::new();
    while rows.read_record(&mut record)? {
        let line = record.position().map_or(0, |pos| pos.line());
        if record.len() != CSV_HEADER.len() {
            return Err(InterchangeError::FieldCount {
                line,
                found: record.len(),
            });
        }
        if record.get(0) == Some(CSV_HEADER[0]) {
            continue;
        }

        let row: InRow = record.deserialize(None)?;
        let start = parse_timestamp(&row.start_at, line)?;
        let end = parse_timestamp(&row.end_before, line)?;
        let interval = Interval::new(schedule, row.person, kind, start, end)
            .map_err(|source| InterchangeError::InvalidInterval { line, source })?;
        out.push(interval);
    }
    Ok(out)
}

fn parse_timestamp(value: &str, line: u64) -> Result<DateTime<Utc>, InterchangeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| InterchangeError::InvalidTimestamp {
            line,
            value: value.to_string(),
        })
}
