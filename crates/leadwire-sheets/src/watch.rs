//! Append-suffix snapshot diffing.
//!
//! The watched range is append-mostly but NOT append-only: claim write-backs
//! land inside it (the manager column), so cell content in already-seen rows
//! changes legitimately. Only the row count drives the diff; a shrink is the
//! one shape this engine refuses to interpret.

use leadwire_core::error::{LeadwireError, Result};

use crate::client::SheetSnapshot;

/// Rows appended since `previous`, as (0-based offset from the range start,
/// row values). `diff(S, S)` is empty; a shrink surfaces as `Anomaly` so the
/// caller can reset its baseline instead of slicing blindly.
pub fn diff<'a>(
    previous: &SheetSnapshot,
    current: &'a SheetSnapshot,
) -> Result<Vec<(usize, &'a [String])>> {
    if current.len() < previous.len() {
        return Err(LeadwireError::Anomaly(format!(
            "Watched range shrank from {} to {} rows",
            previous.len(),
            current.len()
        )));
    }
    Ok(current[previous.len()..]
        .iter()
        .enumerate()
        .map(|(i, row)| (previous.len() + i, row.as_slice()))
        .collect())
}

/// Absolute sheet row for a diffed row. Pure function of the configured
/// start row and the row's 0-based offset from the range start (as reported
/// by [`diff`]); no addressing state is carried between ticks.
pub fn absolute_row(start_row: u32, snapshot_offset: usize) -> u32 {
    start_row + snapshot_offset as u32
}

/// Baseline to adopt after a notification pass over a [`diff`] result:
/// `sent` counts how many of the appended rows actually went out, in order.
/// Rows past the last sent one are left out of the baseline, so the next
/// `diff` against a fresh fetch reports exactly the unsent suffix again,
/// still in ascending order. With every row sent this is the fetch itself.
pub fn advance_baseline(mut current: SheetSnapshot, prev_len: usize, sent: usize) -> SheetSnapshot {
    current.truncate(prev_len + sent);
    current
}
