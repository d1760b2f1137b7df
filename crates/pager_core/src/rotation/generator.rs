//! Load-balanced SHIFT generation over a time window.
//!
//! # Responsibility
//! - Walk the window segment by segment along a [`Style`]'s boundaries.
//! - Give each segment to the least-loaded available person.
//! - Cover the chosen person's exclusions with a conflict-checked backfill.
//!
//! # Invariants
//! - Ties on tally break by person identifier, so output is reproducible.
//! - Only primary shifts are charged to tallies; backfills are not.
//! - Any error leaves the caller's transaction to roll back every insert.

use crate::error::{PagerError, PagerResult};
use crate::model::interval::{Interval, IntervalKind, IntervalValidationError, Person, Span};
use crate::model::participation::ParticipationEvent;
use crate::repo::schedule_repo::{IntervalQuery, ScheduleRepository};
use crate::rotation::boundary::{segments, BoundaryFn, Style};
use crate::rotation::ledger::ParticipationLedger;
use crate::service::conflict_policy::add_interval_checked;
use chrono::Duration;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

/// Accumulated on-call time per person.
pub type Balance = BTreeMap<Person, Duration>;

/// Input for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub schedule: String,
    pub style: Style,
    pub window: Span,
    /// Starting tallies; people not listed start at zero.
    pub initial_balance: Balance,
}

impl GenerateRequest {
    pub fn new(schedule: impl Into<String>, style: Style, window: Span) -> Self {
        Self {
            schedule: schedule.into(),
            style,
            window,
            initial_balance: Balance::new(),
        }
    }

    pub fn with_balance(mut self, balance: Balance) -> Self {
        self.initial_balance = balance;
        self
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOutcome {
    /// Every SHIFT written, primaries and backfills, in insertion order.
    pub inserted: Vec<Interval>,
    /// Tallies after the run.
    pub balance: Balance,
}

pub struct RotationGenerator<'r, R: ScheduleRepository> {
    repo: &'r R,
    boundary: BoundaryFn,
}

impl<'r, R: ScheduleRepository> RotationGenerator<'r, R> {
    pub fn new(repo: &'r R, style: Style) -> Self {
        Self {
            repo,
            boundary: style.boundary_fn(),
        }
    }

    pub(crate) fn with_boundary(repo: &'r R, boundary: BoundaryFn) -> Self {
        Self { repo, boundary }
    }

    /// Generates shifts using the schedule's stored participation events.
    pub fn generate(&self, request: &GenerateRequest) -> PagerResult<GenerateOutcome> {
        let events = self.repo.list_events(&request.schedule)?;
        self.generate_with_events(request, events)
    }

    /// Generates shifts against an explicit set of participation events.
    ///
    /// # Errors
    /// - `Validation` for an empty schedule name or inverted window.
    /// - `NoAvailablePerson` when a segment has nobody on the roster.
    /// - `NotEnoughPeople` when an exclusion of the chosen person cannot be covered.
    /// - `Conflict` when a backfill collides with the substitute's own exclusion.
    pub fn generate_with_events(
        &self,
        request: &GenerateRequest,
        events: Vec<ParticipationEvent>,
    ) -> PagerResult<GenerateOutcome> {
        let started_at = Instant::now();
        if request.schedule.trim().is_empty() {
            return Err(IntervalValidationError::EmptySchedule.into());
        }
        info!(
            "event=generate module=rotation status=start schedule={} style={} window={}",
            request.schedule, request.style, request.window
        );

        let result = self.run(request, events);
        match &result {
            Ok(outcome) => info!(
                "event=generate module=rotation status=ok schedule={} inserted={} duration_ms={}",
                request.schedule,
                outcome.inserted.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=generate module=rotation status=error schedule={} duration_ms={} error={}",
                request.schedule,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn run(
        &self,
        request: &GenerateRequest,
        events: Vec<ParticipationEvent>,
    ) -> PagerResult<GenerateOutcome> {
        let mut ledger = ParticipationLedger::new(events);
        let mut tally = request.initial_balance.clone();
        let mut inserted = Vec::new();

        for segment in segments(request.window, self.boundary)? {
            let available = ledger.advance_to(segment.start)?;
            let people = rank(available, &tally);
            let Some(person) = people.first() else {
                return Err(PagerError::NoAvailablePerson { span: segment });
            };

            *tally.entry(person.clone()).or_insert_with(Duration::zero) += segment.duration();
            let primary = Interval::new(
                request.schedule.as_str(),
                person.as_str(),
                IntervalKind::Shift,
                segment.start,
                segment.end,
            )?;
            self.repo.add_interval(&primary)?;
            debug!(
                "event=generate_segment module=rotation status=ok person={} span={}",
                person, segment
            );
            inserted.push(primary);

            let exclusions = self.repo.list_intervals(&IntervalQuery::new(
                request.schedule.as_str(),
                IntervalKind::Exclusion,
                segment,
            ))?;
            for exclusion in exclusions.iter().filter(|x| &x.person == person) {
                let Some(substitute) = people.get(1) else {
                    return Err(PagerError::NotEnoughPeople {
                        person: person.clone(),
                        span: exclusion.span(),
                    });
                };
                let backfill = Interval {
                    person: substitute.clone(),
                    kind: IntervalKind::Shift,
                    ..exclusion.clone()
                };
                add_interval_checked(self.repo, &backfill)?;
                debug!(
                    "event=backfill module=rotation status=ok person={} covering={} span={}",
                    substitute,
                    person,
                    exclusion.span()
                );
                inserted.push(backfill);
            }
        }

        Ok(GenerateOutcome {
            inserted,
            balance: tally,
        })
    }
}

/// Available people ordered by (tally, identifier).
fn rank(available: &BTreeSet<Person>, tally: &Balance) -> Vec<Person> {
    let mut people: Vec<Person> = available.iter().cloned().collect();
    people.sort_by(|a, b| {
        let ta = tally.get(a).copied().unwrap_or_else(Duration::zero);
        let tb = tally.get(b).copied().unwrap_or_else(Duration::zero);
        ta.cmp(&tb).then_with(|| a.cmp(b))
    });
    people
}

#[cfg(test)]
mod tests {
    use super::{rank, Balance, GenerateRequest, RotationGenerator};
    use crate::db::open_db_in_memory;
    use crate::error::{PagerError, PagerResult};
    use crate::model::interval::{Interval, IntervalKind, Span};
    use crate::model::participation::ParticipationEvent;
    use crate::repo::schedule_repo::{ScheduleRepository, SqliteScheduleRepository};
    use crate::rotation::boundary::Style;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rusqlite::Connection;
    use std::collections::BTreeSet;

    fn t(hours: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap() + Duration::hours(hours)
    }

    fn every_ten_hours(at: DateTime<Utc>) -> PagerResult<DateTime<Utc>> {
        Ok(at + Duration::hours(10))
    }

    fn setup(people: &[&str]) -> Connection {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
        repo.add_schedule("primary").unwrap();
        for person in people {
            repo.add_person(person).unwrap();
        }
        conn
    }

    fn request(hours: i64) -> GenerateRequest {
        GenerateRequest::new(
            "primary",
            Style::MondayAndFridayAtNoonEastern,
            Span::new(t(0), t(hours)).unwrap(),
        )
    }

    fn who(intervals: &[Interval]) -> Vec<&str> {
        intervals.iter().map(|x| x.person.as_str()).collect()
    }

    #[test]
    fn rank_orders_by_tally_then_name() {
        let available: BTreeSet<String> = ["cindy", "bob", "alice"]
            .into_iter()
            .map(String::from)
            .collect();
        let tally = Balance::from([
            ("alice".to_string(), Duration::hours(5)),
            ("cindy".to_string(), Duration::hours(-1)),
        ]);
        assert_eq!(rank(&available, &tally), vec!["cindy", "bob", "alice"]);
    }

    #[test]
    fn rotates_through_people_by_load() {
        let conn = setup(&["alice", "bob"]);
        let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
        let generator = RotationGenerator::with_boundary(&repo, every_ten_hours);
        let events = vec![
            ParticipationEvent::add("primary", "bob", t(0)),
            ParticipationEvent::add("primary", "alice", t(0)),
        ];

        let outcome = generator
            .generate_with_events(&request(35), events)
            .unwrap();

        assert_eq!(who(&outcome.inserted), vec!["alice", "bob", "alice", "bob"]);
        assert_eq!(outcome.inserted[3].span(), Span::new(t(30), t(35)).unwrap());
        assert_eq!(outcome.balance["alice"], Duration::hours(20));
        assert_eq!(outcome.balance["bob"], Duration::hours(15));
    }

    #[test]
    fn later_joiner_is_picked_up_at_next_segment() {
        let conn = setup(&["alice", "bob"]);
        let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
        let generator = RotationGenerator::with_boundary(&repo, every_ten_hours);
        let events = vec![
            ParticipationEvent::add("primary", "alice", t(0)),
            ParticipationEvent::add("primary", "bob", t(5)),
            ParticipationEvent::remove("primary", "alice", t(20)),
        ];

        let outcome = generator
            .generate_with_events(&request(30), events)
            .unwrap();

        assert_eq!(who(&outcome.inserted), vec!["alice", "bob", "bob"]);
    }

    #[test]
    fn exclusion_of_chosen_person_is_backfilled() {
        let conn = setup(&["alice", "bob", "cindy"]);
        let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
        repo.add_interval(
            &Interval::new("primary", "alice", IntervalKind::Exclusion, t(2), t(4)).unwrap(),
        )
        .unwrap();
        let generator = RotationGenerator::with_boundary(&repo, every_ten_hours);
        let events = vec![
            ParticipationEvent::add("primary", "alice", t(0)),
            ParticipationEvent::add("primary", "bob", t(0)),
            ParticipationEvent::add("primary", "cindy", t(0)),
        ];

        let outcome = generator
            .generate_with_events(&request(10), events)
            .unwrap();

        assert_eq!(who(&outcome.inserted), vec!["alice", "bob"]);
        assert_eq!(outcome.inserted[1].span(), Span::new(t(2), t(4)).unwrap());
        assert_eq!(outcome.inserted[1].kind, IntervalKind::Shift);
        assert!(!outcome.balance.contains_key("bob"));
    }

    #[test]
    fn empty_roster_names_the_segment() {
        let conn = setup(&["alice"]);
        let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
        let generator = RotationGenerator::with_boundary(&repo, every_ten_hours);
        let events = vec![ParticipationEvent::add("primary", "alice", t(10))];

        let err = generator
            .generate_with_events(&request(20), events)
            .unwrap_err();

        match err {
            PagerError::NoAvailablePerson { span } => {
                assert_eq!(span, Span::new(t(0), t(10)).unwrap());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lone_person_with_exclusion_cannot_be_covered() {
        let conn = setup(&["alice"]);
        let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
        repo.add_interval(
            &Interval::new("primary", "alice", IntervalKind::Exclusion, t(1), t(3)).unwrap(),
        )
        .unwrap();
        let generator = RotationGenerator::with_boundary(&repo, every_ten_hours);
        let events = vec![ParticipationEvent::add("primary", "alice", t(0))];

        let err = generator
            .generate_with_events(&request(10), events)
            .unwrap_err();

        match err {
            PagerError::NotEnoughPeople { person, span } => {
                assert_eq!(person, "alice");
                assert_eq!(span, Span::new(t(1), t(3)).unwrap());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn substitute_with_own_exclusion_is_a_conflict() {
        let conn = setup(&["alice", "bob"]);
        let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
        for person in ["alice", "bob"] {
            repo.add_interval(
                &Interval::new("primary", person, IntervalKind::Exclusion, t(1), t(3)).unwrap(),
            )
            .unwrap();
        }
        let generator = RotationGenerator::with_boundary(&repo, every_ten_hours);
        let events = vec![
            ParticipationEvent::add("primary", "alice", t(0)),
            ParticipationEvent::add("primary", "bob", t(0)),
        ];

        let err = generator
            .generate_with_events(&request(10), events)
            .unwrap_err();

        assert!(err.is_conflict(), "unexpected error: {err}");
    }

    #[test]
    fn later_exclusion_of_a_third_person_does_not_hide_the_substitutes_own() {
        let conn = setup(&["alice", "bob", "cindy"]);
        let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
        for (person, start, end) in [("alice", 1, 3), ("bob", 1, 3), ("cindy", 0, 5)] {
            repo.add_interval(
                &Interval::new("primary", person, IntervalKind::Exclusion, t(start), t(end))
                    .unwrap(),
            )
            .unwrap();
        }
        let generator = RotationGenerator::with_boundary(&repo, every_ten_hours);
        let events = vec![
            ParticipationEvent::add("primary", "alice", t(0)),
            ParticipationEvent::add("primary", "bob", t(0)),
            ParticipationEvent::add("primary", "cindy", t(0)),
        ];

        let err = generator
            .generate_with_events(&request(10), events)
            .unwrap_err();

        match err {
            PagerError::Conflict {
                candidate,
                existing,
            } => {
                assert_eq!(candidate.person, "bob");
                assert_eq!(existing.person, "bob");
                assert_eq!(existing.kind, IntervalKind::Exclusion);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
