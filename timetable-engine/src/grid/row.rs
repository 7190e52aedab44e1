//! Grid rows.

use serde::Serialize;

use super::cell::{Cell, TimeCell};
use crate::domain::{StopCode, StopTime, TimingStatus};

/// One stop's line across the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub stop: StopCode,
    /// Display name, from the first stop time seen with one.
    pub name: Option<String>,
    /// Strongest timing status of any stop time placed in this row.
    pub timing_status: Option<TimingStatus>,
    pub cells: Vec<Cell>,
}

impl Row {
    /// A row for `stop_time`'s stop, pre-filled with `width` empty cells.
    pub fn new(stop_time: &StopTime, width: usize) -> Self {
        let mut row = Self::empty(stop_time.stop.clone(), width);
        row.absorb(stop_time);
        row
    }

    /// A row for `stop` with `width` empty cells and no metadata yet.
    pub fn empty(stop: StopCode, width: usize) -> Self {
        Self {
            stop,
            name: None,
            timing_status: None,
            cells: vec![Cell::Empty; width],
        }
    }

    /// Record metadata from a stop time placed in this row.
    pub(crate) fn absorb(&mut self, stop_time: &StopTime) {
        if self.name.is_none() {
            self.name.clone_from(&stop_time.stop_name);
        }
        if stop_time.timing_status > self.timing_status {
            self.timing_status = stop_time.timing_status;
        }
    }

    /// Append a cell for `stop_time` as the next column.
    pub(crate) fn push_stop_time(&mut self, stop_time: &StopTime) {
        self.absorb(stop_time);
        self.cells.push(Cell::Time(TimeCell::from_stop_time(stop_time)));
    }

    /// Set the cell at `column` from `stop_time`.
    pub(crate) fn set_stop_time(&mut self, column: usize, stop_time: &StopTime) {
        self.absorb(stop_time);
        self.cells[column] = Cell::Time(TimeCell::from_stop_time(stop_time));
    }

    /// The stop's display name, falling back to its code.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.stop.as_str())
    }

    /// True unless some trip treats this stop as a timing point.
    pub fn is_minor(&self) -> bool {
        !self.timing_status.is_some_and(|s| s.is_timing_point())
    }

    /// Whether any trip waits here, so arrival and departure need separate lines.
    pub fn has_wait_times(&self) -> bool {
        self.cells
            .iter()
            .filter_map(Cell::as_time)
            .any(|c| c.wait_time().is_some())
    }

    /// Cells still shown after abbreviation.
    pub fn visible_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_blanked())
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }
}
