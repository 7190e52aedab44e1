//! Split-working merger.
//!
//! Some producers cut one vehicle working in two at a feed or route boundary:
//! the first half arrives at a stop and, minutes later, the second half
//! departs from it under a different route. Shown as is, the timetable would
//! have two half-empty columns. This module removes exact duplicates and then
//! splices such pairs back into a single trip.

use std::collections::HashMap;

use chrono::Duration;
use tracing::{debug, trace};

use crate::domain::{Route, RouteId, Trip};

/// Drop trips that duplicate an earlier one, keeping the first.
pub fn deduplicate(trips: Vec<Trip>) -> Vec<Trip> {
    let mut kept: Vec<Trip> = Vec::with_capacity(trips.len());
    for trip in trips {
        if let Some(original) = kept.iter().find(|k| k.duplicates(&trip)) {
            trace!(
                trip = %trip.id,
                original = %original.id,
                "Dropping duplicate trip"
            );
            continue;
        }
        kept.push(trip);
    }
    kept
}

/// Whether `b` continues the working `a` ended.
fn continues(a: &Trip, b: &Trip, routes: &HashMap<&RouteId, &Route>, max_gap: Duration) -> bool {
    let (Some(route_a), Some(route_b)) = (routes.get(&a.route), routes.get(&b.route)) else {
        return false;
    };
    if a.route == b.route
        || route_a.source.id != route_b.source.id
        || route_a.line_name != route_b.line_name
    {
        return false;
    }

    let same_ticket_code = a.ticket_machine_code.is_some() && a.ticket_machine_code == b.ticket_machine_code;
    if route_a.service_code == route_b.service_code && !same_ticket_code {
        return false;
    }

    let operator_a = a.operator.as_ref().or(route_a.operator.as_ref());
    let operator_b = b.operator.as_ref().or(route_b.operator.as_ref());
    if operator_a != operator_b {
        return false;
    }

    if a.is_empty() || b.is_empty() || a.is_circular() || b.is_circular() || a.last_stop() != b.origin() {
        return false;
    }

    let gap = b.start - a.end;
    Duration::zero() <= gap && gap <= max_gap
}

/// Append `b` onto `a`, joining them at the stop they share.
///
/// `a`'s last stop takes `b`'s departure and pick-up; the rest of `b`'s stops
/// follow. `a` takes `b`'s end time and destination.
pub fn splice(a: &mut Trip, b: Trip) {
    let mut rest = b.stop_times.into_iter();
    if let (Some(join), Some(last)) = (rest.next(), a.stop_times.last_mut()) {
        last.departure = join.departure;
        last.pick_up = join.pick_up;
    }
    a.stop_times.extend(rest);
    for (i, stop_time) in a.stop_times.iter_mut().enumerate() {
        stop_time.sequence = i as u32;
    }

    for note in b.notes {
        if !a.has_note(&note.id) {
            a.notes.push(note);
        }
    }
    a.end = b.end;
    a.destination = b.destination;
}

/// Deduplicate `trips`, then merge split workings.
///
/// Merges chain: if `b` continues `a` and `c` continues `b`, the result is one
/// trip. Merged trips keep the first half's id, route and direction.
pub fn merge_split_trips(trips: Vec<Trip>, routes: &[Route], max_gap: Duration) -> Vec<Trip> {
    let routes: HashMap<&RouteId, &Route> = routes.iter().map(|r| (&r.id, r)).collect();

    let mut trips = deduplicate(trips);
    trips.sort_by_key(|t| t.start);
    let mut slots: Vec<Option<Trip>> = trips.into_iter().map(Some).collect();

    for i in 0..slots.len() {
        let Some(mut a) = slots[i].take() else {
            continue;
        };
        while let Some(j) = slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|b| continues(&a, b, &routes, max_gap)))
        {
            if let Some(b) = slots[j].take() {
                debug!(
                    first = %a.id,
                    second = %b.id,
                    at = ?a.last_stop().map(|s| s.as_str()),
                    "Merging split trip"
                );
                splice(&mut a, b);
            }
        }
        slots[i] = Some(a);
    }

    slots.into_iter().flatten().collect()
}
