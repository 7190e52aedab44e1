//! Stop-sequence diffing.
//!
//! Rows are built up one trip at a time. Each new trip's stops are aligned
//! against the existing rows with a longest-common-subsequence edit script:
//! shared stops get the trip's times, stops the trip skips get an empty cell,
//! and stops the table hasn't seen yet become new rows at the right position.

use tracing::trace;

use super::cell::Cell;
use super::error::GridError;
use super::row::Row;
use crate::domain::{StopCode, Trip};

/// One step of an edit script turning `old` into `new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `old[old]` and `new[new]` are the same element.
    Equal { old: usize, new: usize },
    /// `old[old]` has no counterpart in `new`.
    Delete { old: usize },
    /// `new[new]` has no counterpart in `old`.
    Insert { new: usize },
}

/// Compute an LCS edit script from `old` to `new`.
///
/// Where the sequences diverge, deletions are emitted before insertions.
///
/// # Examples
///
/// ```
/// use timetable_engine::grid::{Op, diff};
///
/// let ops = diff(&["A", "B", "C"], &["A", "X", "C"]);
/// assert_eq!(
///     ops,
///     vec![
///         Op::Equal { old: 0, new: 0 },
///         Op::Delete { old: 1 },
///         Op::Insert { new: 1 },
///         Op::Equal { old: 2, new: 2 },
///     ]
/// );
/// ```
pub fn diff<T: PartialEq>(old: &[T], new: &[T]) -> Vec<Op> {
    let n = old.len();
    let m = new.len();

    // lcs[i][j] = length of the LCS of old[i..] and new[j..]
    let mut lcs = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            ops.push(Op::Equal { old: i, new: j });
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            ops.push(Op::Delete { old: i });
            i += 1;
        } else {
            ops.push(Op::Insert { new: j });
            j += 1;
        }
    }
    ops.extend((i..n).map(|old| Op::Delete { old }));
    ops.extend((j..m).map(|new| Op::Insert { new }));
    ops
}

/// Add `trip` as a new column after `width` existing columns.
///
/// On success every row has `width + 1` cells.
pub fn add_trip(rows: &mut Vec<Row>, width: usize, trip: &Trip) -> Result<(), GridError> {
    let keys: Vec<&StopCode> = rows.iter().map(|r| &r.stop).collect();
    let ops = diff(&keys, &trip.stop_keys());
    apply_edit_script(rows, width, trip, &ops)
}

pub(crate) fn apply_edit_script(
    rows: &mut Vec<Row>,
    width: usize,
    trip: &Trip,
    ops: &[Op],
) -> Result<(), GridError> {
    let last = trip.stop_times.len().saturating_sub(1);
    // Cursor into `rows`, moving past each row consumed or skipped
    let mut y = 0;

    for op in ops {
        let j = match *op {
            Op::Delete { .. } => {
                y += 1;
                continue;
            }
            Op::Insert { new } => {
                let stop_time = &trip.stop_times[new];
                trace!(stop = %stop_time.stop, row = y, "inserting row");
                rows.insert(y, Row::new(stop_time, width));
                new
            }
            Op::Equal { new, .. } => new,
        };

        let stop_time = &trip.stop_times[j];
        let rows_len = rows.len();
        let row = rows.get_mut(y).ok_or(GridError::RowOutOfRange {
            row: y,
            rows: rows_len,
        })?;
        if row.stop != stop_time.stop {
            return Err(GridError::DiffMismatch {
                expected: row.stop.clone(),
                found: stop_time.stop.clone(),
            });
        }

        row.push_stop_time(stop_time);
        if let Some(cell) = row.cells.last_mut().and_then(Cell::as_time_mut) {
            cell.first = j == 0;
            cell.last = j == last;
        }
        y += 1;
    }

    for row in rows.iter_mut() {
        if row.cells.len() == width {
            row.cells.push(Cell::Empty);
        }
    }

    check_rectangular(rows, width + 1)
}

/// Build rows by diffing each trip in turn against the rows so far.
pub fn rows_by_diff(trips: &[&Trip]) -> Result<Vec<Row>, GridError> {
    let mut rows = Vec::new();
    for (width, trip) in trips.iter().enumerate() {
        add_trip(&mut rows, width, trip)?;
    }
    Ok(rows)
}

pub(crate) fn check_rectangular(rows: &[Row], columns: usize) -> Result<(), GridError> {
    match rows.iter().find(|r| r.cells.len() != columns) {
        Some(row) => Err(GridError::Ragged {
            stop: row.stop.clone(),
            cells: row.cells.len(),
            columns,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CalendarId, Direction, RouteId, ServiceTime, StopTime, TripId};

    fn trip(id: &str, stops: &[&str]) -> Trip {
        let stop_times = stops
            .iter()
            .enumerate()
            .map(|(i, code)| {
                let time = ServiceTime::from_hms(10, i as u32, 0);
                StopTime::new(StopCode::parse(code).unwrap(), Some(time), Some(time))
            })
            .collect();
        Trip::new(
            TripId::new(id),
            RouteId::new("r"),
            CalendarId::new("c"),
            Direction::Outbound,
            stop_times,
        )
    }

    fn row_keys(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.stop.as_str()).collect()
    }

    fn column_keys(rows: &[Row], column: usize) -> Vec<&str> {
        rows.iter()
            .filter(|r| r.cells[column].is_time())
            .map(|r| r.stop.as_str())
            .collect()
    }

    #[test]
    fn diff_identical() {
        let ops = diff(&[1, 2, 3], &[1, 2, 3]);
        assert!(ops.iter().all(|op| matches!(op, Op::Equal { .. })));
    }

    #[test]
    fn diff_empty_sides() {
        assert_eq!(diff::<u8>(&[], &[]), vec![]);
        assert_eq!(diff(&[], &[7]), vec![Op::Insert { new: 0 }]);
        assert_eq!(diff(&[7], &[]), vec![Op::Delete { old: 0 }]);
    }

    #[test]
    fn first_trip_creates_rows() {
        let a = trip("a", &["A", "B", "C"]);
        let rows = rows_by_diff(&[&a]).unwrap();
        assert_eq!(row_keys(&rows), vec!["A", "B", "C"]);

        let first = rows[0].cells[0].as_time().unwrap();
        let last = rows[2].cells[0].as_time().unwrap();
        assert!(first.first && !first.last);
        assert!(last.last && !last.first);
    }

    #[test]
    fn short_working_gets_empty_cells() {
        let a = trip("a", &["A", "B", "C", "D"]);
        let b = trip("b", &["B", "C"]);
        let rows = rows_by_diff(&[&a, &b]).unwrap();

        assert_eq!(row_keys(&rows), vec!["A", "B", "C", "D"]);
        assert_eq!(rows[0].cells[1], Cell::Empty);
        assert!(rows[1].cells[1].as_time().unwrap().first);
        assert!(rows[2].cells[1].as_time().unwrap().last);
        assert_eq!(rows[3].cells[1], Cell::Empty);
    }

    #[test]
    fn new_stops_inserted_in_place() {
        let a = trip("a", &["A", "B", "D"]);
        let b = trip("b", &["A", "C", "D", "E"]);
        let rows = rows_by_diff(&[&a, &b]).unwrap();

        assert_eq!(row_keys(&rows), vec!["A", "B", "C", "D", "E"]);
        // Inserted rows are backfilled for the earlier column
        assert_eq!(rows[2].cells[0], Cell::Empty);
        assert_eq!(rows[4].cells[0], Cell::Empty);
        assert_eq!(column_keys(&rows, 1), vec!["A", "C", "D", "E"]);
    }

    #[test]
    fn loop_visits_same_stop_twice() {
        let a = trip("a", &["A", "B", "C", "A"]);
        let b = trip("b", &["A", "B"]);
        let rows = rows_by_diff(&[&a, &b]).unwrap();

        assert_eq!(row_keys(&rows), vec!["A", "B", "C", "A"]);
        assert_eq!(column_keys(&rows, 0), vec!["A", "B", "C", "A"]);
        assert_eq!(column_keys(&rows, 1), vec!["A", "B"]);
    }

    #[test]
    fn empty_trip_adds_empty_column() {
        let a = trip("a", &["A", "B"]);
        let b = trip("b", &[]);
        let rows = rows_by_diff(&[&a, &b]).unwrap();
        assert!(rows.iter().all(|r| r.cells[1] == Cell::Empty));
    }

    #[test]
    fn forged_equal_is_a_mismatch() {
        let a = trip("a", &["A", "B"]);
        let b = trip("b", &["X", "B"]);
        let mut rows = rows_by_diff(&[&a]).unwrap();

        let ops = [Op::Equal { old: 0, new: 0 }, Op::Equal { old: 1, new: 1 }];
        let err = apply_edit_script(&mut rows, 1, &b, &ops).unwrap_err();
        assert_eq!(
            err,
            GridError::DiffMismatch {
                expected: StopCode::parse("A").unwrap(),
                found: StopCode::parse("X").unwrap(),
            }
        );
    }

    #[test]
    fn forged_equal_past_end() {
        let a = trip("a", &["A"]);
        let b = trip("b", &["A", "B"]);
        let mut rows = rows_by_diff(&[&a]).unwrap();

        let ops = [Op::Equal { old: 0, new: 0 }, Op::Equal { old: 1, new: 1 }];
        let err = apply_edit_script(&mut rows, 1, &b, &ops).unwrap_err();
        assert_eq!(err, GridError::RowOutOfRange { row: 1, rows: 1 });
    }
}
