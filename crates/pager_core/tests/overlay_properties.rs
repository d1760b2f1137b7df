use chrono::{DateTime, Duration, TimeZone, Utc};
use pager_core::{
    conflict, flatten, open_db_in_memory, read_csv, write_csv, Interval, IntervalKind,
    ScheduleRepository, ScheduleService, SqliteScheduleRepository,
};
use proptest::prelude::*;

const PEOPLE: [&str; 4] = ["alice", "bob", "cindy", "dana"];

fn t(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 11, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn interval_strategy(kind: IntervalKind) -> impl Strategy<Value = Interval> {
    (0..PEOPLE.len(), 0i64..60, 1i64..20).prop_map(move |(who, start, len)| {
        Interval::new("s", PEOPLE[who], kind, t(start), t(start + len)).unwrap()
    })
}

fn timeline_strategy() -> impl Strategy<Value = Vec<Interval>> {
    prop::collection::vec(interval_strategy(IntervalKind::Shift), 0..12)
}

proptest! {
    #[test]
    fn flatten_is_idempotent(xs in timeline_strategy()) {
        let once = flatten(&xs).unwrap();
        prop_assert_eq!(flatten(&once).unwrap(), once);
    }

    #[test]
    fn flatten_output_is_sorted_disjoint_and_merged(xs in timeline_strategy()) {
        let out = flatten(&xs).unwrap();
        for pair in out.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start, "overlap in {:?}", pair);
            prop_assert!(
                !(pair[0].end == pair[1].start && pair[0].person == pair[1].person),
                "unmerged neighbours {:?}",
                pair
            );
        }
    }

    #[test]
    fn flatten_keeps_the_latest_writer_at_every_minute(xs in timeline_strategy()) {
        let out = flatten(&xs).unwrap();
        for minute in 0..80 {
            let at = t(minute);
            let latest = xs.iter().rev().find(|x| x.start <= at && at < x.end);
            let shown = out.iter().find(|x| x.start <= at && at < x.end);
            prop_assert_eq!(
                latest.map(|x| x.person.as_str()),
                shown.map(|x| x.person.as_str()),
                "minute {}",
                minute
            );
        }
    }

    #[test]
    fn opposite_kind_overlap_for_same_person_always_conflicts(
        existing in prop::collection::vec(interval_strategy(IntervalKind::Shift), 1..6),
        start in 0i64..60,
        len in 1i64..20,
    ) {
        let existing: Vec<Interval> = existing
            .into_iter()
            .map(|x| Interval { person: "alice".to_string(), ..x })
            .collect();
        let candidate =
            Interval::new("s", "alice", IntervalKind::Exclusion, t(start), t(start + len)).unwrap();

        let overlaps_any = existing.iter().any(|x| x.overlaps(&candidate));
        let found = conflict(&existing, &candidate).unwrap();
        prop_assert_eq!(found.is_some(), overlaps_any);
        if let Some(found) = found {
            prop_assert!(found.overlaps(&candidate));
        }
    }

    #[test]
    fn same_kind_additions_never_conflict(
        xs in prop::collection::vec(interval_strategy(IntervalKind::Exclusion), 0..8),
    ) {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
        repo.add_schedule("s").unwrap();
        for who in PEOPLE {
            repo.add_person(who).unwrap();
        }
        let service = ScheduleService::new(&repo);
        for x in &xs {
            prop_assert!(service.add_interval(x).is_ok());
        }
    }

    #[test]
    fn csv_round_trip(xs in timeline_strategy()) {
        let mut buf = Vec::new();
        write_csv(&mut buf, &xs).unwrap();
        let back = read_csv(buf.as_slice(), "s", IntervalKind::Shift).unwrap();
        prop_assert_eq!(back, xs);
    }
}
