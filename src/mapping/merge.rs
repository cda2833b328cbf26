//! Coalescing sorted row keys into inclusive ranges.
//!
//! Two neighbouring values belong to the same range when they are equal or
//! the second is exactly one past the first. Nothing else is considered
//! adjacent, so targets with a minimum instruction length above one get a
//! range per instruction.

use std::ops::RangeInclusive;

fn coalesce<T, I, F>(sorted: I, successor: F) -> Vec<RangeInclusive<T>>
where
    T: Copy + PartialEq,
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Option<T>,
{
    let mut ranges = Vec::new();
    let mut current: Option<(T, T)> = None;

    for value in sorted {
        current = match current {
            Some((start, last)) if value == last || successor(last) == Some(value) => {
                Some((start, value))
            }
            Some((start, last)) => {
                ranges.push(start..=last);
                Some((value, value))
            }
            None => Some((value, value)),
        };
    }

    if let Some((start, last)) = current {
        ranges.push(start..=last);
    }

    ranges
}

/// Merge ascending addresses into inclusive address ranges.
pub fn address_ranges(sorted: impl IntoIterator<Item = u64>) -> Vec<RangeInclusive<u64>> {
    coalesce(sorted, |address| address.checked_add(1))
}

/// Merge ascending line numbers into inclusive line ranges.
pub fn line_ranges(sorted: impl IntoIterator<Item = i64>) -> Vec<RangeInclusive<i64>> {
    coalesce(sorted, |line| line.checked_add(1))
}
