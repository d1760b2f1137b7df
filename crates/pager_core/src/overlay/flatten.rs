use crate::model::interval::{Interval, IntervalValidationError};

/// Turns a list of overrides into a flat timeline.
///
/// `in_order` is read as the order in which intervals were added: every
/// element overrides whatever earlier elements it overlaps, regardless of
/// person. The result is chronologically sorted, free of overlaps, and
/// consecutive touching entries for the same person are merged.
///
/// # Errors
/// Returns the first interval whose `start` is not before its `end`.
pub fn flatten(in_order: &[Interval]) -> Result<Vec<Interval>, IntervalValidationError> {
    for interval in in_order {
        interval.span().validate()?;
    }
    if in_order.len() < 2 {
        return Ok(in_order.to_vec());
    }

    let mut out: Vec<Interval> = Vec::with_capacity(in_order.len());
    for incoming in in_order {
        let (left, right) = bounds(&out, incoming);
        let replacement = combine(&out[left..right], incoming);
        out.splice(left..right, replacement);
    }

    Ok(merge(out))
}

/// Smallest slice `xs[l..r]` whose members overlap `y`.
///
/// When nothing overlaps, `l == r` and marks the chronological insertion
/// point. `xs` must already be sorted and non-overlapping.
fn bounds(xs: &[Interval], y: &Interval) -> (usize, usize) {
    let left = xs
        .iter()
        .position(|x| x.end > y.start)
        .unwrap_or(xs.len());
    let mut right = xs.len();
    while right > left && xs[right - 1].start >= y.end {
        right -= 1;
    }
    (left, right)
}

/// Lays `y` over `xs`, truncating the outermost members so `y` fits.
fn combine(xs: &[Interval], y: &Interval) -> Vec<Interval> {
    let (Some(first), Some(last)) = (xs.first(), xs.last()) else {
        return vec![y.clone()];
    };

    let mut out = Vec::with_capacity(3);
    if first.start < y.start {
        out.push(first.with_span(first.start, y.start));
    }
    out.push(y.clone());
    if last.end > y.end {
        out.push(last.with_span(y.end, last.end));
    }
    out
}

/// Joins consecutive entries for the same person whose boundaries touch.
fn merge(xs: Vec<Interval>) -> Vec<Interval> {
    let mut out: Vec<Interval> = Vec::with_capacity(xs.len());
    for x in xs {
        if let Some(last) = out.last_mut() {
            if last.end == x.start && last.person == x.person {
                last.end = x.end;
                continue;
            }
        }
        out.push(x);
    }
    out
}
