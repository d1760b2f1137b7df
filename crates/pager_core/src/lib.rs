//! Core domain logic for the pager on-call rotation manager.
//! This crate is the single source of truth for schedule invariants.

pub mod db;
pub mod error;
pub mod interchange;
pub mod logging;
pub mod model;
pub mod overlay;
pub mod repo;
pub mod rotation;
pub mod service;
pub mod sink;

pub use db::{open_db, open_db_in_memory, with_transaction, DbError};
pub use error::{PagerError, PagerResult};
pub use interchange::{read_csv, write_csv, InterchangeError};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig};
pub use model::interval::{Interval, IntervalKind, IntervalValidationError, Person, Span};
pub use model::participation::{EventKind, ParticipationEvent};
pub use overlay::{conflict, flatten, overlap};
pub use repo::schedule_repo::{
    IntervalQuery, RepoError, RepoResult, ScheduleRepository, SqliteScheduleRepository,
};
pub use rotation::boundary::Style;
pub use rotation::generator::{Balance, GenerateOutcome, GenerateRequest, RotationGenerator};
pub use rotation::ledger::ParticipationLedger;
pub use service::schedule_service::{ParticipationAction, ScheduleService};
pub use sink::{PagingSink, SinkError, WriterSink};
