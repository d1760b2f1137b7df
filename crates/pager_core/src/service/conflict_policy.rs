//! Conflict-checked interval insertion.
//!
//! # Responsibility
//! - Reject a new interval that overlaps an opposite-kind interval for the
//!   same person and schedule.
//!
//! # Invariants
//! - Only the candidate's own opposite-kind rows are consulted, so other
//!   people's intervals never mask a conflict. Same-kind overlap is allowed.
//! - Nothing is written when a conflict is found.

use crate::error::{PagerError, PagerResult};
use crate::model::interval::Interval;
use crate::overlay::conflict;
use crate::repo::schedule_repo::{IntervalQuery, ScheduleRepository};
use log::{debug, warn};

/// Inserts `candidate` unless it conflicts with stored intervals.
///
/// # Errors
/// - `Validation` for a malformed candidate.
/// - `Conflict` naming the first opposite-kind row the candidate collides with.
/// - `Repo` for storage failures.
pub fn add_interval_checked<R: ScheduleRepository>(repo: &R, candidate: &Interval) -> PagerResult<()> {
    candidate.validate()?;

    let query = IntervalQuery::new(
        candidate.schedule.as_str(),
        candidate.kind.opposite(),
        candidate.span(),
    )
    .for_person(candidate.person.as_str());
    let existing = repo.list_intervals(&query)?;

    if let Some(existing) = conflict(&existing, candidate)? {
        warn!(
            "event=conflict module=service status=rejected schedule={} person={} kind={} existing_kind={}",
            candidate.schedule, candidate.person, candidate.kind, existing.kind
        );
        return Err(PagerError::Conflict {
            candidate: candidate.clone(),
            existing,
        });
    }

    repo.add_interval(candidate)?;
    debug!(
        "event=interval_add module=service status=ok schedule={} person={} kind={}",
        candidate.schedule, candidate.person, candidate.kind
    );
    Ok(())
}
