//! Global stop ordering.
//!
//! Every trip contributes an edge from each stop to the next. When the
//! resulting graph is acyclic, a topological sort gives one row order that
//! respects every trip at once, and cells can be placed straight into it by
//! stop. Loops and trips that visit a stop twice make the graph cyclic; those
//! groupings fall back to the incremental differ.

use std::collections::HashMap;

use itertools::Itertools;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::debug;

use super::diff::{check_rectangular, rows_by_diff};
use super::error::{CycleDetected, GridError};
use super::row::Row;
use crate::domain::{StopCode, Trip};

/// Which path produced a grouping's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrdering {
    Topological,
    Diff,
}

/// A single stop order consistent with every trip, if one exists.
///
/// Deterministic for a given input order.
pub fn stop_order(trips: &[&Trip]) -> Result<Vec<StopCode>, CycleDetected> {
    let mut graph: DiGraph<&StopCode, ()> = DiGraph::new();
    let mut nodes: HashMap<&StopCode, NodeIndex> = HashMap::new();

    for trip in trips {
        let keys = trip.stop_keys();
        for &stop in &keys {
            nodes.entry(stop).or_insert_with(|| graph.add_node(stop));
        }
        for (a, b) in keys.iter().tuple_windows() {
            graph.update_edge(nodes[a], nodes[b], ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(|n| graph[n].clone()).collect()),
        Err(cycle) => Err(CycleDetected::Stops(graph[cycle.node_id()].clone())),
    }
}

/// Place every trip's stop times into rows laid out in `order`.
pub fn rows_by_order(order: &[StopCode], trips: &[&Trip]) -> Result<Vec<Row>, GridError> {
    let width = trips.len();
    let index: HashMap<&StopCode, usize> = order.iter().enumerate().map(|(i, s)| (s, i)).collect();
    let mut rows: Vec<Row> = order.iter().map(|s| Row::empty(s.clone(), width)).collect();

    for (column, trip) in trips.iter().enumerate() {
        let last = trip.stop_times.len().saturating_sub(1);
        for (j, stop_time) in trip.stop_times.iter().enumerate() {
            let &y = index
                .get(&stop_time.stop)
                .ok_or_else(|| GridError::UnknownStop(stop_time.stop.clone()))?;
            let row = &mut rows[y];
            row.set_stop_time(column, stop_time);
            if let Some(cell) = row.cells[column].as_time_mut() {
                cell.first = j == 0;
                cell.last = j == last;
            }
        }
    }

    check_rectangular(&rows, width)?;
    Ok(rows)
}

/// Build the rows for `trips`, topologically when possible.
///
/// On the diff path the trips are first reordered longest first, so the
/// fullest stop sequence seeds the rows. `trips` is left in the order its
/// columns were built.
pub fn build_rows(trips: &mut [&Trip]) -> Result<(Vec<Row>, RowOrdering), GridError> {
    match stop_order(trips) {
        Ok(order) => Ok((rows_by_order(&order, trips)?, RowOrdering::Topological)),
        Err(cycle) => {
            debug!(
                %cycle,
                trips = trips.len(),
                "Stop graph is cyclic, falling back to diff"
            );
            trips.sort_by_key(|t| std::cmp::Reverse(t.len()));
            Ok((rows_by_diff(trips)?, RowOrdering::Diff))
        }
    }
}

/// Whether every populated column reads down the rows in its trip's order.
#[cfg(test)]
pub(crate) fn columns_follow_trips(rows: &[Row], trips: &[&Trip]) -> bool {
    trips.iter().enumerate().all(|(column, trip)| {
        let placed: Vec<&StopCode> = rows
            .iter()
            .filter(|r| r.cells.get(column).is_some_and(|c| c.is_time()))
            .map(|r| &r.stop)
            .collect();
        placed == trip.stop_keys()
    })
}
