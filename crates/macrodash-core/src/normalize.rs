//! Date alignment across series with different native frequencies.
//!
//! Everything here is a pure function over ordered slices: the source series
//! is walked once with a cursor while target dates advance, so alignment is
//! linear in the combined length.

use crate::domain::{CalendarDate, Observation, Series};
use crate::EngineError;

/// As-of join: for each target date, the most recent source value at or
/// before it, or `None` when the source has not started yet.
///
/// `targets` must be in non-decreasing order. `source` may be in any order;
/// it is sorted into a local copy first.
pub fn forward_fill(source: &[Observation], targets: &[CalendarDate]) -> Vec<Option<f64>> {
    debug_assert!(
        targets.windows(2).all(|w| w[0] <= w[1]),
        "forward_fill targets must be non-decreasing"
    );

    let mut sorted = source.to_vec();
    sorted.sort_by_key(|point| point.date);

    let mut cursor = 0;
    let mut carried = None;
    targets
        .iter()
        .map(|target| {
            while cursor < sorted.len() && sorted[cursor].date <= *target {
                carried = Some(sorted[cursor].value);
                cursor += 1;
            }
            carried
        })
        .collect()
}

/// One date of a grid with every aligned value present.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub date: CalendarDate,
    /// Grid value first, then each other series in argument order.
    pub values: Vec<f64>,
}

/// Forward-fills `others` onto the dates of `grid`, dropping grid dates where
/// any other series has not started yet.
///
/// Fails with `NoOverlap` when no grid date survives.
pub fn align_to_grid(grid: &Series, others: &[&Series]) -> Result<Vec<AlignedRow>, EngineError> {
    let dates = grid.dates();
    let filled: Vec<Vec<Option<f64>>> = others
        .iter()
        .map(|series| forward_fill(series.points(), &dates))
        .collect();

    let rows: Vec<AlignedRow> = grid
        .points()
        .iter()
        .enumerate()
        .filter_map(|(index, point)| {
            let mut values = Vec::with_capacity(others.len() + 1);
            values.push(point.value);
            for column in &filled {
                values.push(column[index]?);
            }
            Some(AlignedRow {
                date: point.date,
                values,
            })
        })
        .collect();

    if rows.is_empty() {
        let right = others
            .iter()
            .map(|series| series.name())
            .collect::<Vec<_>>()
            .join(",");
        return Err(EngineError::NoOverlap {
            left: grid.name().to_owned(),
            right,
        });
    }

    Ok(rows)
}
