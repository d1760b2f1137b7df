//! Interval overlay engine.
//!
//! # Responsibility
//! - Resolve an insertion-ordered list of possibly overlapping intervals into
//!   one canonical, chronological, non-overlapping timeline.
//! - Detect same-person overlaps against that timeline.
//!
//! # Invariants
//! - Input order is override priority: later entries win over earlier ones.
//! - Output of [`flatten`] is sorted by start and mutually non-overlapping.

mod conflict;
mod flatten;

pub use conflict::{conflict, overlap};
pub use flatten::flatten;
