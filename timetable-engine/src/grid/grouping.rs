//! One direction's assembled grid.
//!
//! A `Grouping` is built in a fixed order: trips are put in a canonical order,
//! rows are laid out, columns are sorted by time, heads and feet are
//! computed from the final column order, and repeating runs are abbreviated
//! last so they see the same columns the heads and feet describe.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::annotate::{ColumnFoot, ColumnHead, abbreviate, feet, heads};
use super::cell::Cell;
use super::columns::sort_columns;
use super::error::GridError;
use super::row::Row;
use super::rows::{RowOrdering, build_rows};
use crate::domain::{Direction, Route, RouteId, Trip};

/// How a grouping is assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingOptions {
    /// Show every trip: no abbreviation.
    pub detailed: bool,
    /// Allow "then every hour until".
    pub hourly_abbreviation: bool,
}

/// The inbound or outbound half of a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grouping {
    pub direction: Direction,
    rows: Vec<Row>,
    trips: Vec<Trip>,
    heads: Vec<ColumnHead>,
    feet: Vec<Vec<ColumnFoot>>,
    description: String,
    row_ordering: RowOrdering,
}

impl Grouping {
    /// Assemble the grid for `trips`, all of which run in `direction`.
    ///
    /// The result doesn't depend on the order of `trips`.
    pub fn build(
        direction: Direction,
        trips: &[&Trip],
        routes: &[Route],
        options: GroupingOptions,
    ) -> Result<Self, GridError> {
        let routes: HashMap<&RouteId, &Route> = routes.iter().map(|r| (&r.id, r)).collect();

        let mut trips = trips.to_vec();
        trips.sort_by(|a, b| (a.start, a.end, &a.id).cmp(&(b.start, b.end, &b.id)));

        let (mut rows, row_ordering) = build_rows(&mut trips)?;
        sort_columns(&mut rows, &mut trips)?;

        let heads = heads(&trips, &routes);
        let feet = feet(&trips);
        if !options.detailed {
            abbreviate(&mut rows, &trips, options.hourly_abbreviation);
        }
        let description = describe(direction, &rows, &trips, &routes);

        debug!(
            ?direction,
            rows = rows.len(),
            columns = trips.len(),
            ?row_ordering,
            "Built grouping"
        );

        Ok(Self {
            direction,
            rows,
            trips: trips.into_iter().cloned().collect(),
            heads,
            feet,
            description,
            row_ordering,
        })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Trips in column order.
    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn heads(&self) -> &[ColumnHead] {
        &self.heads
    }

    /// Foot spans, one list per note.
    pub fn feet(&self) -> &[Vec<ColumnFoot>] {
        &self.feet
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the rows came from the stop graph or the diff fallback.
    pub fn row_ordering(&self) -> RowOrdering {
        self.row_ordering
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.trips.len()
    }

    pub fn has_minor_stops(&self) -> bool {
        self.rows.iter().any(Row::is_minor)
    }

    /// Every row has exactly one cell per column.
    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|r| r.width() == self.width())
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

/// The route's description for this direction, otherwise the end stops,
/// otherwise the direction itself.
fn describe(
    direction: Direction,
    rows: &[Row],
    trips: &[&Trip],
    routes: &HashMap<&RouteId, &Route>,
) -> String {
    let from_route = trips
        .iter()
        .filter_map(|t| routes.get(&t.route))
        .find_map(|r| match direction {
            Direction::Outbound => r.outbound_description.as_deref(),
            Direction::Inbound => r.inbound_description.as_deref(),
        });
    if let Some(description) = from_route {
        return description.to_string();
    }

    match (rows.first(), rows.last()) {
        (Some(first), Some(last)) if first.stop != last.stop => {
            format!("{} - {}", first.display_name(), last.display_name())
        }
        _ => match direction {
            Direction::Outbound => "Outbound".to_string(),
            Direction::Inbound => "Inbound".to_string(),
        },
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.description)?;

        let name_width = self
            .rows
            .iter()
            .map(|r| r.display_name().chars().count())
            .max()
            .unwrap_or(0);
        for row in &self.rows {
            write!(f, "{:<name_width$}", row.display_name())?;
            for cell in row.visible_cells() {
                match cell {
                    Cell::Repetition(_) => write!(f, "  {cell}")?,
                    _ => write!(f, "  {:>5}", cell.to_string())?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "grouping_tests.rs"]
mod tests;
