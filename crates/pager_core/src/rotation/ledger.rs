//! Participation ledger: who is on a schedule's roster at a given instant.

use crate::error::{PagerError, PagerResult};
use crate::model::interval::{format_instant, Person};
use crate::model::participation::{EventKind, ParticipationEvent};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Roster derived from ordered ADD/REMOVE events.
///
/// Supports two access patterns: point queries ([`Self::is_available`],
/// [`Self::available_at`]) and a forward-only cursor ([`Self::advance_to`])
/// that applies each event exactly once.
#[derive(Debug, Clone)]
pub struct ParticipationLedger {
    events: Vec<ParticipationEvent>,
    applied: usize,
    position: Option<DateTime<Utc>>,
    available: BTreeSet<Person>,
}

impl ParticipationLedger {
    /// Builds a ledger from events in any order.
    ///
    /// Events are stably sorted by `at`, so events sharing a timestamp keep
    /// the order they were supplied in and the later one wins.
    pub fn new(mut events: Vec<ParticipationEvent>) -> Self {
        events.sort_by_key(|event| event.at);
        Self {
            events,
            applied: 0,
            position: None,
            available: BTreeSet::new(),
        }
    }

    /// Whether `person`'s latest event at or before `at` is an ADD.
    pub fn is_available(&self, person: &str, at: DateTime<Utc>) -> bool {
        self.events
            .iter()
            .take_while(|event| event.at <= at)
            .filter(|event| event.person == person)
            .last()
            .is_some_and(|event| event.kind == EventKind::Add)
    }

    /// Everyone available at `at`, sorted by identifier.
    pub fn available_at(&self, at: DateTime<Utc>) -> BTreeSet<Person> {
        let mut out = BTreeSet::new();
        for event in self.events.iter().take_while(|event| event.at <= at) {
            apply(&mut out, event);
        }
        out
    }

    /// Applies every pending event with `at <= to` and returns the roster.
    ///
    /// # Errors
    /// Returns `InvariantViolation` when `to` is earlier than a previous call.
    pub fn advance_to(&mut self, to: DateTime<Utc>) -> PagerResult<&BTreeSet<Person>> {
        if let Some(position) = self.position {
            if to < position {
                return Err(PagerError::InvariantViolation(format!(
                    "participation ledger cannot rewind from {} to {}",
                    format_instant(position),
                    format_instant(to)
                )));
            }
        }
        self.position = Some(to);

        while let Some(event) = self.events.get(self.applied) {
            if event.at > to {
                break;
            }
            apply(&mut self.available, event);
            self.applied += 1;
        }

        Ok(&self.available)
    }
}

fn apply(roster: &mut BTreeSet<Person>, event: &ParticipationEvent) {
    match event.kind {
        EventKind::Add => {
            roster.insert(event.person.clone());
        }
        EventKind::Remove => {
            roster.remove(&event.person);
        }
    }
}
