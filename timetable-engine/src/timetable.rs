//! Timetable rendering.
//!
//! Ties the pieces together for one render request: resolve which calendars
//! apply, pick the trips that run, merge split workings, and assemble one
//! grouping per direction.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::calendar::{CalendarOption, CalendarResolver, CalendarSelection};
use crate::config::TimetableConfig;
use crate::domain::{CalendarId, Direction, Route, RouteId, Trip};
use crate::grid::{GridError, Grouping, GroupingOptions, merge_split_trips};

/// Error from timetable rendering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimetableError {
    /// Too many trips to render in one go
    #[error("{count} trips is more than the limit of {max}")]
    TooManyTrips { count: usize, max: usize },

    /// The requested calendar isn't one of this timetable's
    #[error("unknown calendar {0}")]
    UnknownCalendar(CalendarId),

    /// Invalid render request
    #[error("invalid timetable request: {0}")]
    InvalidRequest(String),

    /// Grid assembly went wrong
    #[error("internal error assembling timetable: {0}")]
    Internal(#[from] GridError),
}

/// What to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableRequest {
    /// Show the trips running on this date.
    pub date: Option<NaiveDate>,

    /// Show the trips of this calendar, without a date.
    pub calendar: Option<CalendarId>,

    /// Show every trip, unmerged and unabbreviated.
    pub detailed: bool,

    /// The current local date.
    pub today: NaiveDate,
}

impl TimetableRequest {
    /// A request for whatever is most useful as of `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: None,
            calendar: None,
            detailed: false,
            today,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn for_calendar(mut self, calendar: CalendarId) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn detailed(mut self) -> Self {
        self.detailed = true;
        self
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), TimetableError> {
        if self.date.is_some() && self.calendar.is_some() {
            return Err(TimetableError::InvalidRequest(
                "a date and a calendar can't both be chosen".to_string(),
            ));
        }
        Ok(())
    }
}

/// A rendered timetable.
#[derive(Debug, Clone, Serialize)]
pub struct Timetable {
    groupings: Vec<Grouping>,
    date: Option<NaiveDate>,
    calendar: Option<CalendarOption>,
    detailed: bool,
    date_options: Vec<NaiveDate>,
    calendar_options: Vec<CalendarOption>,
    operators: BTreeSet<String>,
    credits: BTreeSet<String>,
}

impl Timetable {
    fn empty(request: &TimetableRequest) -> Self {
        Self {
            groupings: Vec::new(),
            date: request.date,
            calendar: None,
            detailed: request.detailed,
            date_options: Vec::new(),
            calendar_options: Vec::new(),
            operators: BTreeSet::new(),
            credits: BTreeSet::new(),
        }
    }

    /// Outbound first, then inbound. Directions without trips are left out.
    pub fn groupings(&self) -> &[Grouping] {
        &self.groupings
    }

    /// The date shown, if the timetable is for a date.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// The calendar shown, if the timetable is for a weekly pattern.
    pub fn calendar(&self) -> Option<&CalendarOption> {
        self.calendar.as_ref()
    }

    pub fn detailed(&self) -> bool {
        self.detailed
    }

    pub fn date_options(&self) -> &[NaiveDate] {
        &self.date_options
    }

    /// Patterns to choose between. When present there are no groupings.
    pub fn calendar_options(&self) -> &[CalendarOption] {
        &self.calendar_options
    }

    pub fn operators(&self) -> &BTreeSet<String> {
        &self.operators
    }

    pub fn has_multiple_operators(&self) -> bool {
        self.operators.len() > 1
    }

    /// Attribution for every data source with a trip shown.
    pub fn credits(&self) -> &BTreeSet<String> {
        &self.credits
    }

    pub fn is_empty(&self) -> bool {
        self.groupings.iter().all(Grouping::is_empty)
    }

    /// Serialize for the presentation layer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Which calendars a request covers.
enum Scope {
    Date(NaiveDate),
    Calendar(CalendarOption, BTreeSet<CalendarId>),
    Choose(Vec<CalendarOption>),
}

/// Renders timetables for one set of routes.
pub struct TimetableBuilder<'a> {
    routes: &'a [Route],
    trips: &'a [Trip],
    resolver: &'a CalendarResolver,
    config: &'a TimetableConfig,
}

impl<'a> TimetableBuilder<'a> {
    /// Create a new builder.
    pub fn new(
        routes: &'a [Route],
        trips: &'a [Trip],
        resolver: &'a CalendarResolver,
        config: &'a TimetableConfig,
    ) -> Self {
        Self {
            routes,
            trips,
            resolver,
            config,
        }
    }

    /// Render the timetable for `request`.
    pub fn build(&self, request: &TimetableRequest) -> Result<Timetable, TimetableError> {
        request.validate()?;

        let mut timetable = Timetable::empty(request);
        if self.trips.is_empty() {
            return Ok(timetable);
        }

        let scope = self.scope(request)?;
        let date_options = || {
            self.resolver
                .date_options(request.today, self.routes, self.config.date_window(), request.date)
        };
        let routes: HashMap<&RouteId, &Route> = self.routes.iter().map(|r| (&r.id, r)).collect();

        let trips: Vec<&Trip> = match &scope {
            Scope::Choose(options) => {
                debug!(options = options.len(), "Offering calendar choice");
                timetable.calendar_options = options.clone();
                timetable.date_options = date_options();
                return Ok(timetable);
            }
            Scope::Calendar(option, ids) => {
                timetable.calendar = Some(option.clone());
                let until = request.today + self.config.simple_lookahead();
                self.trips
                    .iter()
                    .filter(|t| ids.contains(&t.calendar))
                    .filter(|t| {
                        routes
                            .get(&t.route)
                            .is_none_or(|r| r.is_valid_between(request.today, until))
                    })
                    .collect()
            }
            Scope::Date(date) => {
                timetable.date = Some(*date);
                timetable.date_options = date_options();
                self.trips
                    .iter()
                    .filter(|t| self.resolver.allows(&t.calendar, *date))
                    .filter(|t| routes.get(&t.route).is_none_or(|r| r.is_valid_on(*date)))
                    .collect()
            }
        };

        if trips.len() > self.config.max_trips {
            warn!(
                count = trips.len(),
                max = self.config.max_trips,
                "Too many trips to render"
            );
            return Err(TimetableError::TooManyTrips {
                count: trips.len(),
                max: self.config.max_trips,
            });
        }

        let mut trips: Vec<Trip> = trips.into_iter().cloned().collect();
        if !request.detailed {
            let before = trips.len();
            trips = merge_split_trips(trips, self.routes, self.config.merge_max_gap());
            debug!(before, after = trips.len(), "Merged split trips");
        }

        let options = GroupingOptions {
            detailed: request.detailed,
            hourly_abbreviation: self.config.hourly_abbreviation,
        };
        for direction in [Direction::Outbound, Direction::Inbound] {
            let in_direction: Vec<&Trip> = trips.iter().filter(|t| t.direction == direction).collect();
            if in_direction.is_empty() {
                continue;
            }
            timetable
                .groupings
                .push(Grouping::build(direction, &in_direction, self.routes, options)?);
        }

        for trip in &trips {
            let route = routes.get(&trip.route);
            if let Some(operator) = trip.operator.as_ref().or(route.and_then(|r| r.operator.as_ref())) {
                timetable.operators.insert(operator.clone());
            }
            if let Some(route) = route {
                timetable.credits.insert(route.source.credit());
            }
        }

        debug!(
            trips = trips.len(),
            groupings = timetable.groupings.len(),
            date = ?timetable.date,
            "Built timetable"
        );
        Ok(timetable)
    }

    /// The trip running at `instant`, in the configured time zone.
    pub fn trip_at(&self, instant: DateTime<Utc>) -> Option<&'a Trip> {
        self.resolver.trip_at(instant, self.config.timezone, self.trips)
    }

    fn scope(&self, request: &TimetableRequest) -> Result<Scope, TimetableError> {
        if let Some(id) = &request.calendar {
            let calendar = self
                .resolver
                .get(id)
                .ok_or_else(|| TimetableError::UnknownCalendar(id.clone()))?;
            return Ok(Scope::Calendar(
                CalendarOption {
                    id: id.clone(),
                    description: calendar.describe(),
                },
                BTreeSet::from([id.clone()]),
            ));
        }
        if let Some(date) = request.date {
            return Ok(Scope::Date(date));
        }

        Ok(
            match self
                .resolver
                .select(request.today, self.config.simple_lookahead())
            {
                CalendarSelection::Single(calendars) => match calendars.first() {
                    Some(first) => Scope::Calendar(
                        CalendarOption {
                            id: first.id.clone(),
                            description: first.describe(),
                        },
                        calendars.iter().map(|c| c.id.clone()).collect(),
                    ),
                    None => Scope::Date(request.today),
                },
                CalendarSelection::Options(options) => Scope::Choose(options),
                CalendarSelection::ByDate => Scope::Date(request.today),
            },
        )
    }
}
