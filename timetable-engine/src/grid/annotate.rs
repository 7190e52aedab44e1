//! Column heads, column feet and abbreviation.
//!
//! These run on an assembled grid whose columns are already in order. Heads
//! label runs of trips on the same line, feet label runs of trips carrying the
//! same note, and abbreviation collapses evenly spaced runs of identical trips
//! into a single "then every N minutes until" cell.

use std::collections::HashMap;

use chrono::Duration;
use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use super::cell::{Cell, Repetition};
use super::row::Row;
use crate::domain::{Note, NoteId, Route, RouteId, Trip};

/// A run of consecutive columns on the same line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnHead {
    pub route: RouteId,
    pub line_name: String,
    pub span: usize,
}

/// A run of consecutive columns that all carry `note`, or none of which do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnFoot {
    pub note: Option<Note>,
    pub span: usize,
}

impl ColumnFoot {
    fn gap(span: usize) -> Self {
        Self { note: None, span }
    }

    fn labeled(note: &Note) -> Self {
        Self {
            note: Some(note.clone()),
            span: 1,
        }
    }
}

/// Head spans, split wherever the line name changes.
pub fn heads(trips: &[&Trip], routes: &HashMap<&RouteId, &Route>) -> Vec<ColumnHead> {
    let mut heads: Vec<ColumnHead> = Vec::new();
    for trip in trips {
        let line_name = routes
            .get(&trip.route)
            .map_or(trip.route.as_str(), |r| r.line_name.as_str());
        match heads.last_mut() {
            Some(head) if head.line_name == line_name => head.span += 1,
            _ => heads.push(ColumnHead {
                route: trip.route.clone(),
                line_name: line_name.to_string(),
                span: 1,
            }),
        }
    }
    heads
}

/// Foot spans, one list per distinct note in order of first appearance.
///
/// Each list's spans add up to the number of columns.
pub fn feet(trips: &[&Trip]) -> Vec<Vec<ColumnFoot>> {
    let mut feet: Vec<(NoteId, Vec<ColumnFoot>)> = Vec::new();

    for (i, trip) in trips.iter().enumerate() {
        for note in trip.notes.iter().unique_by(|n| &n.id) {
            match feet.iter_mut().find(|(id, _)| *id == note.id) {
                Some((_, spans)) => {
                    let continuing = i > 0 && trips[i - 1].has_note(&note.id);
                    match spans.last_mut() {
                        Some(last) if continuing && last.note.is_some() => last.span += 1,
                        _ => spans.push(ColumnFoot::labeled(note)),
                    }
                }
                None => {
                    let mut spans = Vec::new();
                    if i > 0 {
                        spans.push(ColumnFoot::gap(i));
                    }
                    spans.push(ColumnFoot::labeled(note));
                    feet.push((note.id.clone(), spans));
                }
            }
        }

        for (id, spans) in feet.iter_mut() {
            if trip.has_note(id) {
                continue;
            }
            match spans.last_mut() {
                Some(last) if last.note.is_none() => last.span += 1,
                _ => spans.push(ColumnFoot::gap(1)),
            }
        }
    }

    feet.into_iter().map(|(_, spans)| spans).collect()
}

/// Whether trips `interval` apart may be shown as one repeating block.
///
/// The interval must divide an hour or be a whole number of hours, and be at
/// most half an hour. Exactly hourly is allowed when `hourly` is set.
pub fn interval_allowed(interval: Duration, hourly: bool) -> bool {
    let secs = interval.num_seconds();
    secs > 0 && (3600 % secs == 0 || secs % 3600 == 0) && (secs <= 1800 || (hourly && secs == 3600))
}

/// Runs of evenly spaced, identical trips: `(first, last, gap)` column
/// indices, inclusive, with at least three equal gaps.
pub(crate) fn repeating_runs(trips: &[&Trip]) -> Vec<(usize, usize, Duration)> {
    let mut runs = Vec::new();
    let mut run_start = 0;
    let mut gap: Option<Duration> = None;

    let mut close = |run_start: usize, end: usize, gap: Option<Duration>| match gap {
        Some(gap) if end >= run_start + 3 => runs.push((run_start, end, gap)),
        _ => {}
    };

    for i in 1..trips.len() {
        let (prev, trip) = (trips[i - 1], trips[i]);
        if prev.notes == trip.notes && prev.matches_pattern(trip) {
            let d = trip.start - prev.start;
            if gap == Some(d) {
                continue;
            }
            close(run_start, i - 1, gap);
            run_start = i - 1;
            gap = Some(d);
        } else {
            close(run_start, i - 1, gap);
            run_start = i;
            gap = None;
        }
    }
    close(run_start, trips.len().saturating_sub(1), gap);

    runs
}

/// Collapse repeating runs in place. Returns how many runs were collapsed.
///
/// Cells are replaced, never removed, so every row keeps one cell per column.
pub fn abbreviate(rows: &mut [Row], trips: &[&Trip], hourly: bool) -> usize {
    if rows.is_empty() {
        return 0;
    }

    let mut collapsed = 0;
    for (first, last, gap) in repeating_runs(trips) {
        if gap.is_zero() {
            // Exact duplicates: only the first departure is worth showing
            for row in rows.iter_mut() {
                row.cells[first + 1..=last].fill(Cell::Blanked);
            }
        } else if interval_allowed(gap, hourly) {
            let hidden = first + 1..last;
            for row in rows.iter_mut() {
                row.cells[hidden.clone()].fill(Cell::Blanked);
            }
            rows[0].cells[first + 1] = Cell::Repetition(Repetition {
                colspan: hidden.len(),
                start: trips[first].start,
                interval_secs: gap.num_seconds() as u32,
            });
        } else {
            continue;
        }

        debug!(
            first = %trips[first].id,
            last = %trips[last].id,
            gap_secs = gap.num_seconds(),
            "Abbreviated repeating trips"
        );
        collapsed += 1;
    }
    collapsed
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{CalendarId, Direction, JourneyPatternId, ServiceTime, StopCode, StopTime, TripId};
    use crate::grid::rows::build_rows;
    use proptest::prelude::*;

    fn trip(n: usize, start: u32) -> Trip {
        let stop_times = (0..3)
            .map(|i| {
                let time = ServiceTime::from_secs(start + 600 * i);
                StopTime::new(StopCode::parse(&format!("S{i}")).unwrap(), Some(time), Some(time))
            })
            .collect();
        let mut trip = Trip::new(
            TripId::new(format!("t{n}")),
            RouteId::new("r"),
            CalendarId::new("c"),
            Direction::Outbound,
            stop_times,
        );
        trip.journey_pattern = Some(JourneyPatternId::new("jp"));
        trip
    }

    proptest! {
        #[test]
        fn repetition_expands_to_hidden_starts(
            count in 4usize..16,
            interval_mins in prop::sample::select(vec![5u32, 6, 10, 12, 15, 20, 30]),
        ) {
            let trips: Vec<Trip> = (0..count)
                .map(|n| trip(n, 21_600 + n as u32 * interval_mins * 60))
                .collect();
            let mut refs: Vec<&Trip> = trips.iter().collect();
            let (mut rows, _) = build_rows(&mut refs).unwrap();

            prop_assert_eq!(abbreviate(&mut rows, &refs, false), 1);
            prop_assert!(rows.iter().all(|r| r.width() == count));

            let Cell::Repetition(rep) = &rows[0].cells[1] else {
                return Err(TestCaseError::fail("no repetition cell"));
            };
            let hidden: Vec<ServiceTime> = refs[1..count - 1].iter().map(|t| t.start).collect();
            prop_assert_eq!(rep.expand(), hidden);
            prop_assert!(rows[0].cells[count - 1].is_time());
        }

        #[test]
        fn feet_cover_every_column(
            marks in prop::collection::vec(prop::collection::vec(any::<bool>(), 3), 0..12),
        ) {
            let notes: Vec<Note> = (0..3)
                .map(|i| Note::new(NoteId::new(format!("n{i}")), format!("N{i}"), "note"))
                .collect();
            let trips: Vec<Trip> = marks
                .iter()
                .enumerate()
                .map(|(n, mark)| {
                    let mut t = trip(n, 21_600 + n as u32 * 60);
                    t.notes = notes.iter().zip(mark).filter(|(_, m)| **m).map(|(n, _)| n.clone()).collect();
                    t
                })
                .collect();
            let refs: Vec<&Trip> = trips.iter().collect();

            for list in feet(&refs) {
                prop_assert_eq!(list.iter().map(|f| f.span).sum::<usize>(), refs.len());
                prop_assert!(list.iter().all(|f| f.span > 0));
            }
        }
    }
}
