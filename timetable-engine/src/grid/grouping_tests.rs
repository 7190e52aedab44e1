//! End-to-end tests for grouping assembly.

use super::*;
use crate::domain::{
    CalendarId, DataSource, JourneyPatternId, Note, NoteId, ServiceTime, SourceId, StopCode, StopTime,
    TimingStatus, TripId,
};
use proptest::prelude::*;

fn time(s: &str) -> ServiceTime {
    ServiceTime::parse(s).unwrap()
}

fn make_route(id: &str, line: &str) -> Route {
    let source = DataSource::new(SourceId::new("tnds"), "Traveline National Dataset");
    Route::new(RouteId::new(id), source, line)
}

fn make_trip(id: &str, calls: &[(&str, &str)]) -> Trip {
    let stop_times = calls
        .iter()
        .map(|(code, t)| {
            let mut st = StopTime::new(StopCode::parse(code).unwrap(), Some(time(t)), Some(time(t)));
            st.stop_name = Some(format!("{code} Street"));
            st
        })
        .collect();
    Trip::new(
        TripId::new(id),
        RouteId::new("r1"),
        CalendarId::new("c"),
        Direction::Outbound,
        stop_times,
    )
}

/// Same-pattern trips along A-B-C, `start` minutes after 06:00 each.
fn frequent(starts: &[u32]) -> Vec<Trip> {
    starts
        .iter()
        .map(|m| {
            let at = |offset: u32| ServiceTime::from_secs((360 + m + offset) * 60).to_string();
            let (a, b, c) = (at(0), at(8), at(15));
            let mut trip = make_trip(
                &format!("f{m}"),
                &[("A", a.as_str()), ("B", b.as_str()), ("C", c.as_str())],
            );
            trip.journey_pattern = Some(JourneyPatternId::new("jp1"));
            trip
        })
        .collect()
}

fn build(trips: &[Trip], options: GroupingOptions) -> Grouping {
    let refs: Vec<&Trip> = trips.iter().collect();
    Grouping::build(Direction::Outbound, &refs, &[make_route("r1", "42")], options).unwrap()
}

fn column_ids(grouping: &Grouping) -> Vec<&str> {
    grouping.trips().iter().map(|t| t.id.as_str()).collect()
}

fn row_keys(grouping: &Grouping) -> Vec<&str> {
    grouping.rows().iter().map(|r| r.stop.as_str()).collect()
}

#[test]
fn branches_share_rows() {
    let trips = vec![
        make_trip("via-b", &[("A", "09:00"), ("B", "09:10"), ("D", "09:20")]),
        make_trip("via-c", &[("A", "08:00"), ("C", "08:12"), ("D", "08:25")]),
        make_trip("short", &[("B", "10:10"), ("D", "10:20")]),
    ];
    let grouping = build(&trips, GroupingOptions::default());

    assert!(grouping.is_rectangular());
    assert_eq!(grouping.row_ordering(), RowOrdering::Topological);
    assert_eq!(column_ids(&grouping), vec!["via-c", "via-b", "short"]);
    assert_eq!(grouping.rows().len(), 4);
    assert_eq!(grouping.description(), "A Street - D Street");

    let a = &grouping.rows()[0];
    assert_eq!(a.stop.as_str(), "A");
    assert_eq!(a.cells[2], Cell::Empty);
}

#[test]
fn circular_route_uses_diff() {
    let trips = vec![
        make_trip("loop", &[("A", "09:00"), ("B", "09:10"), ("C", "09:20"), ("A", "09:30")]),
        make_trip("part", &[("A", "10:00"), ("B", "10:10")]),
    ];
    let grouping = build(&trips, GroupingOptions::default());

    assert_eq!(grouping.row_ordering(), RowOrdering::Diff);
    assert_eq!(row_keys(&grouping), vec!["A", "B", "C", "A"]);
    assert!(grouping.is_rectangular());
    // Same first and last stop: no "from - to" description
    assert_eq!(grouping.description(), "Outbound");
}

#[test]
fn frequent_service_abbreviated() {
    let trips = frequent(&[0, 10, 20, 30, 40, 50, 60]);
    let grouping = build(&trips, GroupingOptions::default());

    assert_eq!(grouping.width(), 7);
    assert!(grouping.is_rectangular());
    let first_row = &grouping.rows()[0];
    assert!(matches!(first_row.cells[1], Cell::Repetition(_)));
    assert_eq!(first_row.visible_cells().count(), 3);

    let text = grouping.to_string();
    assert!(text.contains("then every 10 minutes until"), "{text}");
    assert!(text.contains("06:00"));
    assert!(text.contains("07:00"));
}

#[test]
fn detailed_shows_every_trip() {
    let trips = frequent(&[0, 10, 20, 30, 40, 50, 60]);
    let options = GroupingOptions {
        detailed: true,
        ..Default::default()
    };
    let grouping = build(&trips, options);
    assert!(
        grouping
            .rows()
            .iter()
            .all(|r| r.cells.iter().all(Cell::is_time))
    );
}

#[test]
fn heads_and_feet_span_all_columns() {
    let mut trips = frequent(&[0, 20, 40]);
    trips[1].notes.push(Note::new(NoteId::new("sch"), "Sch", "Schooldays only"));
    let grouping = build(&trips, GroupingOptions::default());

    assert_eq!(grouping.heads().len(), 1);
    assert_eq!(grouping.heads()[0].line_name, "42");
    assert_eq!(grouping.heads()[0].span, 3);

    assert_eq!(grouping.feet().len(), 1);
    let spans: Vec<usize> = grouping.feet()[0].iter().map(|f| f.span).collect();
    assert_eq!(spans, vec![1, 1, 1]);
}

#[test]
fn route_description_preferred() {
    let trips = frequent(&[0]);
    let refs: Vec<&Trip> = trips.iter().collect();
    let mut route = make_route("r1", "42");
    route.outbound_description = Some("Town Centre - Hospital".into());

    let grouping = Grouping::build(Direction::Outbound, &refs, &[route.clone()], GroupingOptions::default()).unwrap();
    assert_eq!(grouping.description(), "Town Centre - Hospital");

    // No inbound description: fall back to the end stops
    let grouping = Grouping::build(Direction::Inbound, &refs, &[route], GroupingOptions::default()).unwrap();
    assert_eq!(grouping.description(), "A Street - C Street");
}

#[test]
fn minor_stops_detected() {
    let mut trips = frequent(&[0]);
    assert!(build(&trips, GroupingOptions::default()).has_minor_stops());

    for st in &mut trips[0].stop_times {
        st.timing_status = Some(TimingStatus::TimingPoint);
    }
    assert!(!build(&trips, GroupingOptions::default()).has_minor_stops());
}

#[test]
fn empty_grouping() {
    let grouping = build(&[], GroupingOptions::default());
    assert!(grouping.is_empty());
    assert!(grouping.rows().is_empty());
    assert!(grouping.is_rectangular());
    assert_eq!(grouping.to_string(), "Outbound\n");
}

#[test]
fn serializes_for_presentation() {
    let trips = frequent(&[0, 10, 20, 30]);
    let grouping = build(&trips, GroupingOptions::default());
    let json = serde_json::to_value(&grouping).unwrap();

    assert_eq!(json["direction"], "outbound");
    assert_eq!(json["row_ordering"], "topological");
    assert_eq!(json["rows"][0]["cells"][1]["type"], "repetition");
    assert_eq!(json["rows"][0]["cells"][1]["value"]["colspan"], 2);
}

proptest! {
    #[test]
    fn input_order_does_not_matter(
        shuffled in Just((0..8).collect::<Vec<usize>>()).prop_shuffle(),
        detailed in any::<bool>(),
    ) {
        let mut trips = frequent(&[0, 15, 30, 45, 60]);
        trips.push(make_trip("branch", &[("A", "06:05"), ("X", "06:12"), ("C", "06:25")]));
        trips.push(make_trip("short", &[("B", "07:30"), ("C", "07:37")]));
        trips.push(make_trip("late", &[("A", "23:50"), ("B", "24:02"), ("C", "24:10")]));

        let options = GroupingOptions { detailed, ..Default::default() };
        let expected = build(&trips, options);
        let reordered: Vec<Trip> = shuffled.iter().map(|&i| trips[i].clone()).collect();
        let actual = build(&reordered, options);

        prop_assert_eq!(actual.rows(), expected.rows());
        prop_assert_eq!(column_ids(&actual), column_ids(&expected));
        prop_assert!(actual.is_rectangular());
    }
}
