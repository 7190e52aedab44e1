//! Calendar resolution.
//!
//! Decides which calendars, and so which trips, a timetable shows: for a
//! chosen date, for a single simple weekly pattern, or for a wall-clock
//! instant that may fall in the small hours of the previous service day.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, trace};

use crate::domain::{BankHolidays, Calendar, CalendarId, Route, ServiceTime, Trip};

/// A weekly pattern the caller can choose instead of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarOption {
    pub id: CalendarId,
    pub description: String,
}

/// How a timetable without an explicit date should pick its trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarSelection {
    /// Every calendar has the same simple pattern: show them together
    /// without a date.
    Single(Vec<Arc<Calendar>>),
    /// Several simple patterns on different days: let the caller choose.
    Options(Vec<CalendarOption>),
    /// Too irregular to summarise: pick a date.
    ByDate,
}

/// The calendars relevant to one timetable, plus the bank holidays they
/// refer to.
#[derive(Debug, Clone, Default)]
pub struct CalendarResolver {
    calendars: BTreeMap<CalendarId, Arc<Calendar>>,
    bank_holidays: BankHolidays,
}

impl CalendarResolver {
    pub fn new(calendars: impl IntoIterator<Item = Arc<Calendar>>, bank_holidays: BankHolidays) -> Self {
        Self {
            calendars: calendars.into_iter().map(|c| (c.id.clone(), c)).collect(),
            bank_holidays,
        }
    }

    pub fn get(&self, id: &CalendarId) -> Option<&Arc<Calendar>> {
        self.calendars.get(id)
    }

    pub fn calendars(&self) -> impl Iterator<Item = &Arc<Calendar>> {
        self.calendars.values()
    }

    pub fn bank_holidays(&self) -> &BankHolidays {
        &self.bank_holidays
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    /// Whether calendar `id` operates on `date`. Unknown calendars never do.
    pub fn allows(&self, id: &CalendarId, date: NaiveDate) -> bool {
        self.calendars
            .get(id)
            .is_some_and(|c| c.allows(date, &self.bank_holidays))
    }

    /// Calendars operating on `date`.
    pub fn allowed_calendars(&self, date: NaiveDate) -> Vec<&Arc<Calendar>> {
        self.calendars
            .values()
            .filter(|c| c.allows(date, &self.bank_holidays))
            .collect()
    }

    /// Choose between a single pattern, a choice of patterns, or a date.
    ///
    /// Patterns are only offered when every calendar is free of exceptions
    /// and bank-holiday rules for the next `lookahead`.
    pub fn select(&self, today: NaiveDate, lookahead: Duration) -> CalendarSelection {
        let future = today + lookahead;
        let simple = !self.calendars.is_empty()
            && self.calendars.values().all(|c| {
                !c.days.is_empty() && c.is_sufficiently_simple(today, future, &self.bank_holidays)
            });
        if !simple {
            debug!(calendars = self.calendars.len(), "Calendars not simple, selecting by date");
            return CalendarSelection::ByDate;
        }

        let calendars: Vec<&Arc<Calendar>> = self.calendars.values().collect();
        if calendars.iter().all(|c| c.days == calendars[0].days) {
            return CalendarSelection::Single(calendars.into_iter().map(Arc::clone).collect());
        }

        let disjoint = calendars
            .iter()
            .enumerate()
            .all(|(i, a)| calendars[i + 1..].iter().all(|b| a.days.is_disjoint(&b.days)));
        if disjoint {
            let options = calendars
                .iter()
                .map(|c| CalendarOption {
                    id: c.id.clone(),
                    description: c.describe(),
                })
                .collect();
            return CalendarSelection::Options(options);
        }

        CalendarSelection::ByDate
    }

    /// Dates to offer in a date picker.
    ///
    /// Starts at the later of `today` and the earliest route start, skips
    /// ahead past a closure covering every calendar, and runs for `window`
    /// or until the last route ends. A `requested` date missing from the
    /// list is appended.
    pub fn date_options(
        &self,
        today: NaiveDate,
        routes: &[Route],
        window: Duration,
        requested: Option<NaiveDate>,
    ) -> Vec<NaiveDate> {
        let mut start = routes
            .iter()
            .filter_map(|r| r.start_date)
            .min()
            .map_or(today, |earliest| earliest.max(today));

        while let Some(reopens) = self.closed_until(start) {
            trace!(%start, %reopens, "Skipping closure");
            start = reopens;
        }

        let mut end = start + window;
        let route_ends: Option<Vec<NaiveDate>> = routes.iter().map(|r| r.end_date).collect();
        if let Some(last) = route_ends.and_then(|ends| ends.into_iter().max()) {
            end = end.min(last + Duration::days(1));
        }

        let mut dates: Vec<NaiveDate> = start
            .iter_days()
            .take_while(|d| *d < end)
            .filter(|d| self.calendars.values().any(|c| c.allows(*d, &self.bank_holidays)))
            .collect();

        if let Some(requested) = requested.filter(|d| !dates.contains(d)) {
            dates.push(requested);
        }
        dates
    }

    /// If every calendar has a closure covering `date`, the first date one
    /// of them reopens.
    fn closed_until(&self, date: NaiveDate) -> Option<NaiveDate> {
        if self.calendars.is_empty() {
            return None;
        }
        self.calendars
            .values()
            .map(|c| c.closure_end(date))
            .collect::<Option<Vec<_>>>()?
            .into_iter()
            .min()
            .and_then(|end| end.succ_opt())
    }

    /// The trip running at `instant`, as seen in time zone `tz`.
    ///
    /// Trips run past midnight on the previous day's service, so both today
    /// and yesterday's service are considered. The latest-starting match
    /// wins.
    pub fn trip_at<'a>(&self, instant: DateTime<Utc>, tz: Tz, trips: &'a [Trip]) -> Option<&'a Trip> {
        let local = instant.with_timezone(&tz);
        let date = local.date_naive();
        let time_of_day = ServiceTime::from_secs(local.num_seconds_from_midnight());

        let mut service_days = vec![(date, time_of_day)];
        if let Some(yesterday) = date.pred_opt() {
            let offset = time_of_day.as_secs() + ServiceTime::ONE_DAY.as_secs();
            service_days.push((yesterday, ServiceTime::from_secs(offset)));
        }

        trips
            .iter()
            .filter(|trip| {
                service_days.iter().any(|&(day, offset)| {
                    trip.start <= offset && offset <= trip.end && self.allows(&trip.calendar, day)
                })
            })
            .max_by_key(|trip| trip.start)
    }
}
