//! Trips and their stop times.
//!
//! A `Trip` is one scheduled vehicle working along a route: an ordered list
//! of `StopTime`s plus the metadata needed to group, merge and abbreviate it.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{CalendarId, JourneyPatternId, NoteId, RouteId, ServiceTime, StopCode, TripId};

/// Which half of a timetable a trip belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Outbound,
    Inbound,
}

impl Direction {
    pub fn is_inbound(&self) -> bool {
        matches!(self, Direction::Inbound)
    }
}

/// Whether a stop time is binding on the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimingStatus {
    /// Informal intermediate estimate.
    Other,
    TimingPoint,
    PrincipalTimingPoint,
}

impl TimingStatus {
    pub fn is_timing_point(&self) -> bool {
        !matches!(self, TimingStatus::Other)
    }
}

/// A footnote such as "Schooldays only".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Short marker shown in cells, e.g. "Sch".
    pub code: String,
    pub text: String,
}

impl Note {
    pub fn new(id: NoteId, code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            text: text.into(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A single visit to a stop within a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime {
    pub stop: StopCode,
    #[serde(default)]
    pub stop_name: Option<String>,
    #[serde(default)]
    pub arrival: Option<ServiceTime>,
    #[serde(default)]
    pub departure: Option<ServiceTime>,
    #[serde(default)]
    pub sequence: u32,
    #[serde(default = "default_true")]
    pub pick_up: bool,
    #[serde(default = "default_true")]
    pub set_down: bool,
    #[serde(default)]
    pub timing_status: Option<TimingStatus>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl StopTime {
    pub fn new(stop: StopCode, arrival: Option<ServiceTime>, departure: Option<ServiceTime>) -> Self {
        Self {
            stop,
            stop_name: None,
            arrival,
            departure,
            sequence: 0,
            pick_up: true,
            set_down: true,
            timing_status: None,
            notes: Vec::new(),
        }
    }

    /// The departure time, falling back to the arrival time.
    pub fn departure_or_arrival(&self) -> Option<ServiceTime> {
        self.departure.or(self.arrival)
    }

    /// The arrival time, falling back to the departure time.
    pub fn arrival_or_departure(&self) -> Option<ServiceTime> {
        self.arrival.or(self.departure)
    }

    /// Time spent waiting at the stop, when arrival and departure differ.
    pub fn wait_time(&self) -> Option<Duration> {
        match (self.arrival, self.departure) {
            (Some(arr), Some(dep)) if dep > arr => Some(dep - arr),
            _ => None,
        }
    }
}

/// One scheduled vehicle working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub route: RouteId,
    pub calendar: CalendarId,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub journey_pattern: Option<JourneyPatternId>,
    pub start: ServiceTime,
    pub end: ServiceTime,
    #[serde(default)]
    pub destination: Option<StopCode>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub garage: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub ticket_machine_code: Option<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    pub stop_times: Vec<StopTime>,
}

impl Trip {
    /// Creates a trip, taking start and end times from its stop times.
    ///
    /// Stop times are renumbered from zero and the destination is taken from
    /// the last stop.
    pub fn new(
        id: TripId,
        route: RouteId,
        calendar: CalendarId,
        direction: Direction,
        mut stop_times: Vec<StopTime>,
    ) -> Self {
        for (i, stop_time) in stop_times.iter_mut().enumerate() {
            stop_time.sequence = i as u32;
        }

        let start = stop_times
            .first()
            .and_then(StopTime::departure_or_arrival)
            .unwrap_or_default();
        let end = stop_times
            .last()
            .and_then(StopTime::arrival_or_departure)
            .unwrap_or(start);
        let destination = stop_times.last().map(|s| s.stop.clone());

        Self {
            id,
            route,
            calendar,
            direction,
            journey_pattern: None,
            start,
            end,
            destination,
            operator: None,
            garage: None,
            vehicle_type: None,
            ticket_machine_code: None,
            notes: Vec::new(),
            stop_times,
        }
    }

    /// The stop codes visited, in order. These are the keys the grid aligns on.
    pub fn stop_keys(&self) -> Vec<&StopCode> {
        self.stop_times.iter().map(|s| &s.stop).collect()
    }

    pub fn origin(&self) -> Option<&StopCode> {
        self.stop_times.first().map(|s| &s.stop)
    }

    pub fn last_stop(&self) -> Option<&StopCode> {
        self.stop_times.last().map(|s| &s.stop)
    }

    /// True when the trip finishes where it started.
    pub fn is_circular(&self) -> bool {
        self.origin() == self.last_stop()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn len(&self) -> usize {
        self.stop_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stop_times.is_empty()
    }

    /// Whether two trips are the same pattern for abbreviation purposes.
    ///
    /// Both need a journey pattern; trips without one never match.
    pub fn matches_pattern(&self, other: &Trip) -> bool {
        self.journey_pattern.is_some()
            && self.journey_pattern == other.journey_pattern
            && self.destination == other.destination
            && self.duration() == other.duration()
    }

    /// Whether two trips are exact duplicates of each other.
    pub fn duplicates(&self, other: &Trip) -> bool {
        self.start == other.start
            && self.end == other.end
            && self.destination == other.destination
            && self.stop_times.len() == other.stop_times.len()
    }

    /// Whether the trip carries a note with this id.
    pub fn has_note(&self, id: &NoteId) -> bool {
        self.notes.iter().any(|n| &n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ServiceTime {
        ServiceTime::parse(s).unwrap()
    }

    fn stop(s: &str) -> StopCode {
        StopCode::parse(s).unwrap()
    }

    fn make_trip(id: &str, calls: &[(&str, &str)]) -> Trip {
        let stop_times = calls
            .iter()
            .map(|(code, time)| StopTime::new(stop(code), Some(t(time)), Some(t(time))))
            .collect();
        Trip::new(
            TripId::new(id),
            RouteId::new("r"),
            CalendarId::new("c"),
            Direction::Outbound,
            stop_times,
        )
    }

    #[test]
    fn new_derives_times_and_destination() {
        let trip = make_trip("1", &[("A", "10:00"), ("B", "10:10"), ("C", "10:25")]);
        assert_eq!(trip.start, t("10:00"));
        assert_eq!(trip.end, t("10:25"));
        assert_eq!(trip.destination, Some(stop("C")));
        assert_eq!(trip.duration(), Duration::minutes(25));
        assert_eq!(
            trip.stop_times.iter().map(|s| s.sequence).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn circular_trip() {
        let trip = make_trip("1", &[("A", "10:00"), ("B", "10:10"), ("A", "10:25")]);
        assert!(trip.is_circular());
        let trip = make_trip("2", &[("A", "10:00"), ("B", "10:10")]);
        assert!(!trip.is_circular());
    }

    #[test]
    fn pattern_matching_needs_journey_pattern() {
        let a = make_trip("1", &[("A", "10:00"), ("B", "10:10")]);
        let b = make_trip("2", &[("A", "10:30"), ("B", "10:40")]);
        assert!(!a.matches_pattern(&b));

        let mut a = a;
        let mut b = b;
        a.journey_pattern = Some(JourneyPatternId::new("jp1"));
        b.journey_pattern = Some(JourneyPatternId::new("jp1"));
        assert!(a.matches_pattern(&b));

        // A different running time breaks the match
        b.end = t("10:45");
        assert!(!a.matches_pattern(&b));
    }

    #[test]
    fn wait_time_only_when_departure_later() {
        let mut st = StopTime::new(stop("A"), Some(t("10:00")), Some(t("10:05")));
        assert_eq!(st.wait_time(), Some(Duration::minutes(5)));
        st.departure = Some(t("10:00"));
        assert_eq!(st.wait_time(), None);
        st.arrival = None;
        assert_eq!(st.wait_time(), None);
    }

    #[test]
    fn time_fallbacks() {
        let st = StopTime::new(stop("A"), Some(t("10:00")), None);
        assert_eq!(st.departure_or_arrival(), Some(t("10:00")));
        let st = StopTime::new(stop("A"), None, Some(t("10:02")));
        assert_eq!(st.arrival_or_departure(), Some(t("10:02")));
    }

    #[test]
    fn deserialize_with_defaults() {
        let json = r#"{
            "id": "t1",
            "route": "r1",
            "calendar": "c1",
            "start": 36000,
            "end": 36600,
            "stop_times": [
                {"stop": "A", "departure": 36000},
                {"stop": "B", "arrival": 36600, "pick_up": false}
            ]
        }"#;
        let trip: Trip = serde_json::from_str(json).unwrap();
        assert_eq!(trip.direction, Direction::Outbound);
        assert!(trip.stop_times[0].pick_up);
        assert!(!trip.stop_times[1].pick_up);
        assert!(trip.stop_times[1].set_down);
        assert_eq!(trip.start, t("10:00"));
    }
}
