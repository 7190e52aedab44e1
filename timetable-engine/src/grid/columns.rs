//! Column ordering.
//!
//! Trips are ordered so times increase reading along any row. Two trips that
//! share a row are compared there, and the earlier one gets an edge to the
//! later one; a topological sort of those edges is the column order. Overtaking
//! and branching can make the edges cyclic, in which case a pairwise
//! comparison is applied with a binary insertion sort, which stays
//! well-defined when the comparison isn't transitive.

use std::cmp::Ordering;

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use tracing::debug;

use super::cell::TimeCell;
use super::diff::check_rectangular;
use super::error::{CycleDetected, GridError};
use super::row::Row;
use crate::domain::{ServiceTime, Trip};

/// One column's populated cells, indexed by row.
struct Column<'a> {
    cells: Vec<Option<&'a TimeCell>>,
    /// First and last populated rows.
    span: Option<(usize, usize)>,
    start: ServiceTime,
    end: ServiceTime,
}

impl<'a> Column<'a> {
    fn new(rows: &'a [Row], column: usize, trip: &Trip) -> Self {
        let cells: Vec<Option<&TimeCell>> = rows
            .iter()
            .map(|r| r.cells.get(column).and_then(|c| c.as_time()))
            .collect();
        let first = cells.iter().position(Option::is_some);
        let last = cells.iter().rposition(Option::is_some);
        Self {
            cells,
            span: first.zip(last),
            start: trip.start,
            end: trip.end,
        }
    }
}

/// Order of `a` and `b` at the first row in their overlapping range where
/// both have a time. `None` if there is no such row.
fn shared_row_order(a: &Column, b: &Column) -> Option<Ordering> {
    let (a_first, a_last) = a.span?;
    let (b_first, b_last) = b.span?;
    let (lo, hi) = (a_first.max(b_first), a_last.min(b_last));
    if lo > hi {
        return None;
    }

    (lo..=hi).find_map(|y| {
        let (ca, cb) = (a.cells[y]?, b.cells[y]?);
        let (ta, tb) = (ca.time()?, cb.time()?);
        Some(match ta.cmp(&tb) {
            // One trip ends where and when the next begins
            Ordering::Equal if ca.last && cb.first => Ordering::Less,
            Ordering::Equal if ca.first && cb.last => Ordering::Greater,
            ordering => ordering,
        })
    })
}

/// Pairwise fallback comparison. Not guaranteed to be transitive.
fn compare_columns(a: &Column, b: &Column) -> Ordering {
    if let Some(ordering) = shared_row_order(a, b).filter(|o| o.is_ne()) {
        return ordering;
    }
    match (a.span, b.span) {
        // a's rows all sit above b's
        (Some((_, a_last)), Some((b_first, _))) if a_last < b_first => a.end.cmp(&b.start),
        // b's rows all sit above a's
        (Some((a_first, _)), Some((_, b_last))) if b_last < a_first => a.start.cmp(&b.end),
        _ => a.start.cmp(&b.start),
    }
}

/// Topological column order from shared-row comparisons.
fn topological_order(columns: &[Column], trips: &[&Trip]) -> Result<Vec<usize>, CycleDetected> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(columns.len(), 0);
    let nodes: Vec<_> = (0..columns.len()).map(|i| graph.add_node(i)).collect();

    for (i, a) in columns.iter().enumerate() {
        for (j, b) in columns.iter().enumerate().skip(i + 1) {
            match shared_row_order(a, b) {
                Some(Ordering::Less) => {
                    graph.add_edge(nodes[i], nodes[j], ());
                }
                Some(Ordering::Greater) => {
                    graph.add_edge(nodes[j], nodes[i], ());
                }
                _ => {}
            }
        }
    }

    toposort(&graph, None)
        .map(|order| order.into_iter().map(|n| graph[n]).collect())
        .map_err(|cycle| CycleDetected::Trips(trips[graph[cycle.node_id()]].id.clone()))
}

/// Stable binary insertion sort by [`compare_columns`].
fn fallback_order(columns: &[Column]) -> Vec<usize> {
    let mut order: Vec<usize> = Vec::with_capacity(columns.len());
    for i in 0..columns.len() {
        let at = order.partition_point(|&j| compare_columns(&columns[j], &columns[i]).is_le());
        order.insert(at, i);
    }
    order
}

/// Column order for `rows`, whose columns are `trips`.
pub fn column_order(rows: &[Row], trips: &[&Trip]) -> Vec<usize> {
    let columns: Vec<Column> = trips
        .iter()
        .enumerate()
        .map(|(i, trip)| Column::new(rows, i, trip))
        .collect();

    match topological_order(&columns, trips) {
        Ok(order) => order,
        Err(cycle) => {
            debug!(%cycle, trips = trips.len(), "Column order is cyclic, using comparison sort");
            fallback_order(&columns)
        }
    }
}

/// Reorder the columns of `rows` and the entries of `trips` together.
pub fn sort_columns(rows: &mut [Row], trips: &mut Vec<&Trip>) -> Result<(), GridError> {
    let order = column_order(rows, trips);
    permute(rows, trips, &order);
    check_rectangular(rows, trips.len())
}

/// Move column `order[k]` to position `k`.
fn permute(rows: &mut [Row], trips: &mut Vec<&Trip>, order: &[usize]) {
    let mut rank = vec![0; order.len()];
    for (position, &column) in order.iter().enumerate() {
        rank[column] = position;
    }

    for row in rows.iter_mut() {
        let mut cells: Vec<_> = std::mem::take(&mut row.cells).into_iter().enumerate().collect();
        cells.sort_by_key(|(column, _)| rank.get(*column).copied().unwrap_or(usize::MAX));
        row.cells = cells.into_iter().map(|(_, cell)| cell).collect();
    }
    *trips = order.iter().map(|&i| trips[i]).collect();
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{CalendarId, Direction, RouteId, StopCode, StopTime, TripId};
    use crate::grid::rows::{build_rows, columns_follow_trips};
    use proptest::prelude::*;

    // Trips along one master route at a common running speed: times at any
    // stop are consistent with start order, so no overtaking.
    prop_compose! {
        fn arb_trips()(
            specs in prop::collection::vec(
                (0u32..600, prop::collection::vec(any::<bool>(), 6)),
                1..8,
            )
        ) -> Vec<Trip> {
            specs
                .into_iter()
                .enumerate()
                .map(|(n, (start_min, mask))| {
                    let stop_times = mask
                        .iter()
                        .enumerate()
                        .filter(|(_, keep)| **keep)
                        .map(|(i, _)| {
                            let time = ServiceTime::from_secs((360 + start_min + 5 * i as u32) * 60);
                            StopTime::new(StopCode::parse(&format!("S{i}")).unwrap(), Some(time), Some(time))
                        })
                        .collect();
                    Trip::new(
                        TripId::new(format!("t{n}")),
                        RouteId::new("r"),
                        CalendarId::new("c"),
                        Direction::Outbound,
                        stop_times,
                    )
                })
                .collect()
        }
    }

    proptest! {
        #[test]
        fn rows_read_in_time_order(trips in arb_trips()) {
            let mut refs: Vec<&Trip> = trips.iter().collect();
            let (mut rows, _) = build_rows(&mut refs).unwrap();
            sort_columns(&mut rows, &mut refs).unwrap();

            prop_assert!(columns_follow_trips(&rows, &refs));
            for row in &rows {
                let times: Vec<ServiceTime> = row.cells.iter().filter_map(|c| c.time()).collect();
                prop_assert!(times.windows(2).all(|w| w[0] <= w[1]), "row {} out of order", row.stop);
            }
        }
    }
}
