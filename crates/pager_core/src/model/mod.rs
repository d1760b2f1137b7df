//! Schedule domain model.
//!
//! # Responsibility
//! - Define the records shared by the overlay engine, the rotation generator
//!   and the persistence layer.
//!
//! # Invariants
//! - Every interval satisfies `start < end`.
//! - Intervals and participation events are immutable once created.

pub mod interval;
pub mod participation;
