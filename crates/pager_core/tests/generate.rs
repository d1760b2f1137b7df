use chrono::{DateTime, Duration, TimeZone, Utc};
use pager_core::{
    open_db_in_memory, with_transaction, Balance, GenerateRequest, Interval, IntervalKind,
    IntervalQuery,
    PagerError, PagerResult, ParticipationAction, ScheduleRepository, ScheduleService, Span,
    SqliteScheduleRepository, Style,
};
use rusqlite::Connection;

const PEOPLE: [&str; 4] = ["alice", "bob", "cindy", "delila"];

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

fn seeded(joined: DateTime<Utc>) -> Connection {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = ScheduleService::new(&repo);
    service.add_schedule("primary").unwrap();
    let actions: Vec<_> = PEOPLE
        .iter()
        .map(|who| ParticipationAction::add(*who, joined))
        .collect();
    service.edit_participation("primary", &actions).unwrap();
    conn
}

fn stored_shifts(conn: &Connection) -> usize {
    let repo = SqliteScheduleRepository::try_new(conn).unwrap();
    repo.list_intervals(&IntervalQuery::new(
        "primary",
        IntervalKind::Shift,
        Span::new(utc(2000, 1, 1, 0, 0, 0), utc(2100, 1, 1, 0, 0, 0)).unwrap(),
    ))
    .unwrap()
    .len()
}

#[test]
fn balanced_rotation_over_three_weeks() {
    let start = utc(2022, 2, 26, 17, 24, 8);
    let conn = seeded(start - Duration::days(1));
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = ScheduleService::new(&repo);
    let balance = Balance::from([
        ("alice".to_string(), Duration::hours(-24)),
        ("bob".to_string(), Duration::zero()),
        ("cindy".to_string(), Duration::hours(72)),
        ("delila".to_string(), Duration::zero()),
    ]);
    let request = GenerateRequest::new(
        "primary",
        Style::MondayAndFridayAtNoonEastern,
        Span::new(start, start + Duration::days(21)).unwrap(),
    )
    .with_balance(balance);

    let outcome = service.generate(&request).unwrap();

    let got: Vec<(&str, DateTime<Utc>, DateTime<Utc>)> = outcome
        .inserted
        .iter()
        .map(|x| (x.person.as_str(), x.start, x.end))
        .collect();
    assert_eq!(
        got,
        vec![
            ("alice", start, utc(2022, 2, 28, 17, 0, 0)),
            ("bob", utc(2022, 2, 28, 17, 0, 0), utc(2022, 3, 4, 17, 0, 0)),
            ("delila", utc(2022, 3, 4, 17, 0, 0), utc(2022, 3, 7, 17, 0, 0)),
            ("alice", utc(2022, 3, 7, 17, 0, 0), utc(2022, 3, 11, 17, 0, 0)),
            ("cindy", utc(2022, 3, 11, 17, 0, 0), utc(2022, 3, 14, 16, 0, 0)),
            ("delila", utc(2022, 3, 14, 16, 0, 0), utc(2022, 3, 18, 16, 0, 0)),
            ("bob", utc(2022, 3, 18, 16, 0, 0), utc(2022, 3, 19, 17, 24, 8)),
        ]
    );
    assert!(outcome
        .inserted
        .iter()
        .all(|x| x.kind == IntervalKind::Shift && x.schedule == "primary"));
    assert_eq!(stored_shifts(&conn), 7);
}

fn add_exclusion(conn: &Connection, person: &str, start: DateTime<Utc>, end: DateTime<Utc>) {
    let repo = SqliteScheduleRepository::try_new(conn).unwrap();
    ScheduleService::new(&repo)
        .add_interval(&Interval::new("primary", person, IntervalKind::Exclusion, start, end).unwrap())
        .unwrap();
}

#[test]
fn failed_run_after_inserts_commits_nothing() {
    let start = utc(2022, 2, 26, 17, 24, 8);
    let mut conn = seeded(start - Duration::days(1));
    add_exclusion(&conn, "alice", utc(2022, 2, 27, 0, 0, 0), utc(2022, 2, 27, 6, 0, 0));
    {
        let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
        let leave: Vec<_> = PEOPLE
            .iter()
            .map(|who| ParticipationAction::remove(*who, utc(2022, 3, 3, 0, 0, 0)))
            .collect();
        ScheduleService::new(&repo)
            .edit_participation("primary", &leave)
            .unwrap();
    }
    let request = GenerateRequest::new(
        "primary",
        Style::MondayAndFridayAtNoonEastern,
        Span::new(start, start + Duration::days(21)).unwrap(),
    );

    let mut written_before_failure = 0;
    let result: PagerResult<_> = with_transaction(&mut conn, |tx| {
        let repo = SqliteScheduleRepository::try_new(tx)?;
        let outcome = ScheduleService::new(&repo).generate(&request);
        written_before_failure = stored_shifts(tx);
        outcome
    });

    match result {
        Err(PagerError::NoAvailablePerson { span }) => {
            assert_eq!(span.start, utc(2022, 3, 4, 17, 0, 0));
            assert_eq!(span.end, utc(2022, 3, 7, 17, 0, 0));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    // alice's weekend, bob's backfill, bob's week
    assert_eq!(written_before_failure, 3);
    assert_eq!(stored_shifts(&conn), 0);
}

#[test]
fn backfill_overrides_primary_in_shown_timeline() {
    let start = utc(2022, 2, 26, 17, 24, 8);
    let handoff = utc(2022, 2, 28, 17, 0, 0);
    let conn = seeded(start - Duration::days(1));
    add_exclusion(&conn, "alice", utc(2022, 2, 27, 0, 0, 0), utc(2022, 2, 27, 6, 0, 0));
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = ScheduleService::new(&repo);
    let window = Span::new(start, handoff).unwrap();

    let outcome = service
        .generate(&GenerateRequest::new(
            "primary",
            Style::MondayAndFridayAtNoonEastern,
            window,
        ))
        .unwrap();
    let inserted: Vec<&str> = outcome.inserted.iter().map(|x| x.person.as_str()).collect();
    assert_eq!(inserted, vec!["alice", "bob"]);

    let shown_intervals = service.show_schedule("primary", window).unwrap();
    let shown: Vec<(&str, DateTime<Utc>, DateTime<Utc>)> = shown_intervals
        .iter()
        .map(|x| (x.person.as_str(), x.start, x.end))
        .collect();
    assert_eq!(
        shown,
        vec![
            ("alice", start, utc(2022, 2, 27, 0, 0, 0)),
            ("bob", utc(2022, 2, 27, 0, 0, 0), utc(2022, 2, 27, 6, 0, 0)),
            ("alice", utc(2022, 2, 27, 6, 0, 0), handoff),
        ]
    );
}

#[test]
fn unknown_style_is_rejected_by_name() {
    let err = "EveryOtherTuesday".parse::<Style>().unwrap_err();
    assert!(matches!(err, PagerError::UnsupportedStyle(ref name) if name == "EveryOtherTuesday"));
}
