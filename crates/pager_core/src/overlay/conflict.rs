use super::flatten::flatten;
use crate::model::interval::{Interval, IntervalValidationError};

/// Half-open overlap test: touching intervals do not overlap.
pub fn overlap(a: &Interval, b: &Interval) -> bool {
    a.end > b.start && b.end > a.start
}

/// Finds the entry of `existing` that conflicts with `candidate`.
///
/// `existing` is flattened first, so only the parts of it that survive
/// later overrides are considered. The first chronological entry for the
/// same person that overlaps `candidate` is returned.
///
/// # Errors
/// Returns a validation error if `candidate` or any of `existing` is inverted.
pub fn conflict(
    existing: &[Interval],
    candidate: &Interval,
) -> Result<Option<Interval>, IntervalValidationError> {
    candidate.span().validate()?;
    let timeline = flatten(existing)?;
    Ok(timeline
        .into_iter()
        .find(|x| x.person == candidate.person && overlap(x, candidate)))
}
