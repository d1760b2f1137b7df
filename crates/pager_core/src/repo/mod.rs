//! Persistence contracts and their SQLite implementation.
//!
//! # Invariants
//! - Writes validate intervals before touching storage.
//! - Reads reject rows that no longer parse instead of skipping them.

pub mod schedule_repo;
