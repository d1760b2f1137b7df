//! Schedule use-case service.
//!
//! # Responsibility
//! - Provide one entry point per user command over a [`ScheduleRepository`].
//! - Apply the cross-kind conflict policy to user-added intervals.
//!
//! # Invariants
//! - Callers run each method inside one transaction; a returned error means
//!   the caller must roll back.
//! - `show_schedule` never writes.

use crate::error::PagerResult;
use crate::interchange::read_csv;
use crate::model::interval::{Interval, IntervalKind, IntervalValidationError, Person, Span};
use crate::model::participation::{EventKind, ParticipationEvent};
use crate::overlay::flatten;
use crate::repo::schedule_repo::{IntervalQuery, ScheduleRepository};
use crate::rotation::generator::{GenerateOutcome, GenerateRequest, RotationGenerator};
use crate::service::conflict_policy::add_interval_checked;
use crate::sink::PagingSink;
use chrono::{DateTime, Utc};
use log::info;
use std::io::Read;

/// One roster change requested by `edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipationAction {
    pub kind: EventKind,
    pub who: Person,
    pub at: DateTime<Utc>,
}

impl ParticipationAction {
    pub fn add(who: impl Into<Person>, at: DateTime<Utc>) -> Self {
        Self {
            kind: EventKind::Add,
            who: who.into(),
            at,
        }
    }

    pub fn remove(who: impl Into<Person>, at: DateTime<Utc>) -> Self {
        Self {
            kind: EventKind::Remove,
            who: who.into(),
            at,
        }
    }
}

pub struct ScheduleService<R: ScheduleRepository> {
    repo: R,
}

impl<R: ScheduleRepository> ScheduleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn add_schedule(&self, name: &str) -> PagerResult<()> {
        if name.trim().is_empty() {
            return Err(IntervalValidationError::EmptySchedule.into());
        }
        self.repo.add_schedule(name)?;
        info!("event=schedule_add module=service status=ok");
        Ok(())
    }

    pub fn add_person(&self, name: &str) -> PagerResult<()> {
        if name.trim().is_empty() {
            return Err(IntervalValidationError::EmptyPerson.into());
        }
        self.repo.add_person(name)?;
        info!("event=person_add module=service status=ok");
        Ok(())
    }

    /// Adds a user-supplied interval under the cross-kind conflict policy.
    pub fn add_interval(&self, interval: &Interval) -> PagerResult<()> {
        add_interval_checked(&self.repo, interval)
    }

    /// Flattened SHIFT timeline for `schedule`, clamped to `window`.
    pub fn show_schedule(&self, schedule: &str, window: Span) -> PagerResult<Vec<Interval>> {
        window.validate()?;
        let stored = self
            .repo
            .list_intervals(&IntervalQuery::new(schedule, IntervalKind::Shift, window))?;

        let timeline = flatten(&stored)?
            .into_iter()
            .map(|x| {
                let start = x.start.max(window.start);
                let end = x.end.min(window.end);
                x.with_span(start, end)
            })
            .collect();
        Ok(timeline)
    }

    /// Appends participation events in the order given.
    pub fn edit_participation(
        &self,
        schedule: &str,
        actions: &[ParticipationAction],
    ) -> PagerResult<()> {
        if schedule.trim().is_empty() {
            return Err(IntervalValidationError::EmptySchedule.into());
        }
        for action in actions {
            let event = ParticipationEvent {
                schedule: schedule.to_string(),
                person: action.who.clone(),
                kind: action.kind,
                at: action.at,
            };
            self.repo.add_event(&event)?;
        }
        info!(
            "event=participation_edit module=service status=ok actions={}",
            actions.len()
        );
        Ok(())
    }

    pub fn generate(&self, request: &GenerateRequest) -> PagerResult<GenerateOutcome> {
        RotationGenerator::new(&self.repo, request.style).generate(request)
    }

    /// Reads SHIFT rows from `input` and hands them to `sink` unchanged.
    pub fn apply<In: Read, S: PagingSink>(
        &self,
        input: In,
        sink: &mut S,
        schedule: &str,
    ) -> PagerResult<usize> {
        let intervals = read_csv(input, schedule, IntervalKind::Shift)?;
        sink.apply(schedule, &intervals)?;
        info!(
            "event=apply module=service status=ok intervals={}",
            intervals.len()
        );
        Ok(intervals.len())
    }
}
