use chrono::{DateTime, Duration, TimeZone, Utc};
use pager_core::{
    open_db_in_memory, EventKind, PagerError, ParticipationAction, ParticipationLedger,
    ScheduleRepository, ScheduleService, SqliteScheduleRepository,
};

fn t(hours: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).unwrap() + Duration::hours(hours)
}

#[test]
fn edits_append_events_that_drive_availability() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    repo.add_schedule("primary").unwrap();
    let service = ScheduleService::new(&repo);

    service
        .edit_participation(
            "primary",
            &[
                ParticipationAction::add("alice", t(0)),
                ParticipationAction::add("bob", t(2)),
                ParticipationAction::remove("alice", t(5)),
            ],
        )
        .unwrap();

    let events = repo.list_events("primary").unwrap();
    let kinds: Vec<EventKind> = events.iter().map(|event| event.kind).collect();
    assert_eq!(kinds, vec![EventKind::Add, EventKind::Add, EventKind::Remove]);

    let ledger = ParticipationLedger::new(events);
    assert!(ledger.is_available("alice", t(4)));
    assert!(!ledger.is_available("alice", t(5)));
    assert!(ledger.is_available("bob", t(5)));
}

#[test]
fn edit_on_unknown_schedule_fails_as_storage_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = ScheduleService::new(&repo);

    let err = service
        .edit_participation("ghost", &[ParticipationAction::add("alice", t(0))])
        .unwrap_err();
    assert!(matches!(err, PagerError::Repo(_)));
}

#[test]
fn blank_schedule_is_rejected_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let service = ScheduleService::new(&repo);

    let err = service.edit_participation("  ", &[]).unwrap_err();
    assert!(matches!(err, PagerError::Validation(_)));
}
