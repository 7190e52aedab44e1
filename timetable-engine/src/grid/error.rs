//! Grid assembly error types.
//!
//! These only occur if the assembly code itself is wrong: a render that hits
//! one must fail rather than show a misaligned table.

use crate::domain::{StopCode, TripId};

/// Internal consistency failures while assembling a grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// An edit script claimed two different stops were equal
    #[error("diff mismatch: row is {expected} but trip stop is {found}")]
    DiffMismatch { expected: StopCode, found: StopCode },

    /// An edit script pointed past the end of the rows
    #[error("diff points at row {row} but there are only {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },

    /// A trip visits a stop the row order doesn't contain
    #[error("stop {0} has no row")]
    UnknownStop(StopCode),

    /// A row ended up with the wrong number of cells
    #[error("row {stop} has {cells} cells but the grid has {columns} columns")]
    Ragged {
        stop: StopCode,
        cells: usize,
        columns: usize,
    },
}

/// A topological sort found no consistent order.
///
/// Not a failure: callers fall back to a comparison sort.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleDetected {
    #[error("stop order has a cycle through {0}")]
    Stops(StopCode),

    #[error("trip order has a cycle through {0}")]
    Trips(TripId),
}
