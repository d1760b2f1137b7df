//! Rotation generation.
//!
//! # Responsibility
//! - Produce rotation segment boundaries for a generation style.
//! - Track who is on the roster at any instant.
//! - Assign each segment to the least-loaded available person and backfill
//!   that person's exclusions.
//!
//! # Invariants
//! - Boundaries strictly increase; anything else is an invariant violation.
//! - Generation is all-or-nothing: callers run it inside one transaction.

pub mod boundary;
pub mod generator;
pub mod ledger;
