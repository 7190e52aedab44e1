//! Grid cells.
//!
//! Every row holds exactly one `Cell` per column. Abbreviation never removes
//! cells; it replaces them with `Repetition` or `Blanked` so rows stay the
//! same length.

use std::fmt;

use chrono::Duration;
use serde::Serialize;

use crate::domain::{ServiceTime, StopTime, TimingStatus};

/// A populated cell: one trip's visit to one row's stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeCell {
    pub arrival: Option<ServiceTime>,
    pub departure: Option<ServiceTime>,
    pub pick_up: bool,
    pub set_down: bool,
    pub timing_status: Option<TimingStatus>,
    /// First stop of the trip.
    pub first: bool,
    /// Last stop of the trip.
    pub last: bool,
}

impl TimeCell {
    pub fn from_stop_time(stop_time: &StopTime) -> Self {
        Self {
            arrival: stop_time.arrival,
            departure: stop_time.departure,
            pick_up: stop_time.pick_up,
            set_down: stop_time.set_down,
            timing_status: stop_time.timing_status,
            first: false,
            last: false,
        }
    }

    /// The time to compare and display: arrival at the last stop, otherwise
    /// departure, each falling back to the other.
    pub fn time(&self) -> Option<ServiceTime> {
        if self.last {
            self.arrival.or(self.departure)
        } else {
            self.departure.or(self.arrival)
        }
    }

    /// Time spent at the stop, when arrival and departure differ.
    pub fn wait_time(&self) -> Option<Duration> {
        match (self.arrival, self.departure) {
            (Some(arr), Some(dep)) if dep > arr => Some(dep - arr),
            _ => None,
        }
    }
}

/// An abbreviated block of evenly spaced trips.
///
/// Sits in the first row at the first hidden column and covers `colspan`
/// columns across every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repetition {
    pub colspan: usize,
    /// Start time of the visible trip immediately before the block.
    pub start: ServiceTime,
    pub interval_secs: u32,
}

impl Repetition {
    pub fn interval(&self) -> Duration {
        Duration::seconds(i64::from(self.interval_secs))
    }

    /// Start times of the trips the block hides: `start + n × interval`
    /// for `n` in `1..=colspan`.
    pub fn expand(&self) -> Vec<ServiceTime> {
        (1..=self.colspan)
            .map(|n| ServiceTime::from_secs(self.start.as_secs() + n as u32 * self.interval_secs))
            .collect()
    }
}

impl fmt::Display for Repetition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.interval_secs / 60;
        match minutes {
            60 => f.write_str("then every hour until"),
            m if m % 60 == 0 => write!(f, "then every {} hours until", m / 60),
            m => write!(f, "then every {m} minutes until"),
        }
    }
}

/// One position in the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Time(TimeCell),
    /// The trip doesn't call at this row's stop.
    Empty,
    Repetition(Repetition),
    /// Hidden by abbreviation.
    Blanked,
}

impl Cell {
    pub fn as_time(&self) -> Option<&TimeCell> {
        match self {
            Cell::Time(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_time_mut(&mut self) -> Option<&mut TimeCell> {
        match self {
            Cell::Time(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn is_time(&self) -> bool {
        matches!(self, Cell::Time(_))
    }

    /// The comparison time of a populated cell.
    pub fn time(&self) -> Option<ServiceTime> {
        self.as_time().and_then(TimeCell::time)
    }

    pub fn is_blanked(&self) -> bool {
        matches!(self, Cell::Blanked)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Time(cell) => match cell.time() {
                Some(time) => write!(f, "{time}"),
                None => f.write_str("|"),
            },
            Cell::Empty => Ok(()),
            Cell::Repetition(rep) => write!(f, "{rep}"),
            Cell::Blanked => Ok(()),
        }
    }
}
