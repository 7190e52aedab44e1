//! Operating calendars.
//!
//! A `Calendar` says on which dates a trip runs: a weekly pattern bounded by
//! a validity range, overridden by dated exceptions and by bank-holiday
//! rules. Calendars are immutable once imported and shared between all trips
//! with the same operating pattern.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::CalendarId;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Weekly operating pattern, Monday first.
///
/// # Examples
///
/// ```
/// use timetable_engine::domain::Weekdays;
/// use chrono::Weekday;
///
/// let days = Weekdays::MONDAY_TO_FRIDAY;
/// assert!(days.allows(Weekday::Wed));
/// assert!(!days.allows(Weekday::Sat));
/// assert_eq!(days.to_string(), "Monday to Friday");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weekdays([bool; 7]);

impl Weekdays {
    pub const MONDAY_TO_FRIDAY: Weekdays = Weekdays([true, true, true, true, true, false, false]);
    pub const EVERY_DAY: Weekdays = Weekdays([true; 7]);

    pub fn new(days: [bool; 7]) -> Self {
        Self(days)
    }

    /// A pattern running on a single day of the week.
    pub fn only(day: Weekday) -> Self {
        let mut days = [false; 7];
        days[day.num_days_from_monday() as usize] = true;
        Self(days)
    }

    pub fn allows(&self, day: Weekday) -> bool {
        self.0[day.num_days_from_monday() as usize]
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&d| d)
    }

    /// True when no weekday is shared with `other`.
    pub fn is_disjoint(&self, other: &Weekdays) -> bool {
        !self.0.iter().zip(other.0.iter()).any(|(&a, &b)| a && b)
    }
}

impl fmt::Display for Weekdays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days: Vec<usize> = (0..7).filter(|&i| self.0[i]).collect();

        match days.as_slice() {
            [] => f.write_str("No regular days"),
            [_, _, _, _, _, _, _] => f.write_str("Every day"),
            [only] => write!(f, "{}s", DAY_NAMES[*only]),
            [first, .., last] if days.len() >= 3 && last - first + 1 == days.len() => {
                write!(f, "{} to {}", DAY_NAMES[*first], DAY_NAMES[*last])
            }
            [init @ .., last] => {
                let names: Vec<&str> = init.iter().map(|&i| DAY_NAMES[i]).collect();
                write!(f, "{} and {}", names.join(", "), DAY_NAMES[*last])
            }
        }
    }
}

/// A dated exception to a calendar's weekly pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Whether the service operates (true) or is withdrawn (false) in the range.
    pub operation: bool,
    /// An extra, one-off operating day worth calling out to passengers.
    #[serde(default)]
    pub special: bool,
}

impl CalendarDate {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, operation: bool) -> Self {
        Self {
            start_date,
            end_date,
            operation,
            special: false,
        }
    }

    /// Whether this exception covers `date`.
    pub fn relates(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Whether this exception covers any part of `[start, end]`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

/// A rule for whether a calendar operates on a named bank holiday.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarBankHoliday {
    pub bank_holiday: String,
    pub operation: bool,
}

/// Dates of named bank holidays, supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankHolidays {
    dates: BTreeMap<NaiveDate, Vec<String>>,
}

impl BankHolidays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, name: impl Into<String>) {
        self.dates.entry(date).or_default().push(name.into());
    }

    /// Names of the bank holidays falling on `date`.
    pub fn names_on(&self, date: NaiveDate) -> &[String] {
        self.dates.get(&date).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Bank holidays falling within `[start, end]`.
    pub fn between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = (NaiveDate, &str)> {
        self.dates
            .range(start..=end)
            .flat_map(|(date, names)| names.iter().map(move |n| (*date, n.as_str())))
    }
}

/// The content of a calendar that makes two calendars interchangeable.
///
/// Used to deduplicate calendars during import. The id and the summary are
/// not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CalendarKey {
    days: Weekdays,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    exceptions: Vec<CalendarDate>,
    bank_holidays: Vec<CalendarBankHoliday>,
}

/// An operating calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: CalendarId,
    pub days: Weekdays,
    pub start_date: NaiveDate,
    /// Last date of operation, if known.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub exceptions: Vec<CalendarDate>,
    #[serde(default)]
    pub bank_holidays: Vec<CalendarBankHoliday>,
    /// Producer-supplied description such as "School days".
    #[serde(default)]
    pub summary: Option<String>,
}

impl Calendar {
    pub fn new(id: CalendarId, days: Weekdays, start_date: NaiveDate) -> Self {
        Self {
            id,
            days,
            start_date,
            end_date: None,
            exceptions: Vec::new(),
            bank_holidays: Vec::new(),
            summary: None,
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_exception(mut self, exception: CalendarDate) -> Self {
        self.exceptions.push(exception);
        self
    }

    pub fn with_bank_holiday(mut self, name: impl Into<String>, operation: bool) -> Self {
        self.bank_holidays.push(CalendarBankHoliday {
            bank_holiday: name.into(),
            operation,
        });
        self
    }

    /// Whether `date` falls within the validity range.
    pub fn in_range(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.is_none_or(|end| date <= end)
    }

    /// Whether the calendar operates on `date`.
    ///
    /// Outside the validity range it never operates. Inside, the first
    /// exception covering the date decides, then any bank-holiday rule for a
    /// bank holiday on that date, then the weekly pattern.
    pub fn allows(&self, date: NaiveDate, bank_holidays: &BankHolidays) -> bool {
        if !self.in_range(date) {
            return false;
        }

        if let Some(exception) = self.exceptions.iter().find(|e| e.relates(date)) {
            return exception.operation;
        }

        let names = bank_holidays.names_on(date);
        if let Some(rule) = self
            .bank_holidays
            .iter()
            .find(|rule| names.iter().any(|n| n == &rule.bank_holiday))
        {
            return rule.operation;
        }

        self.days.allows(date.weekday())
    }

    /// If a non-operating exception covers `date`, the last date it covers.
    pub fn closure_end(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.exceptions
            .iter()
            .filter(|e| !e.operation && e.relates(date))
            .map(|e| e.end_date)
            .max()
    }

    /// Whether the weekly pattern alone describes the calendar between
    /// `today` and `future`.
    ///
    /// Exceptions outside the window and "special" extra days don't count;
    /// neither do bank-holiday rules for holidays outside the window.
    pub fn is_sufficiently_simple(
        &self,
        today: NaiveDate,
        future: NaiveDate,
        bank_holidays: &BankHolidays,
    ) -> bool {
        if self.start_date > today {
            return false;
        }
        if self.end_date.is_some_and(|end| end < future) {
            return false;
        }

        let exceptions_simple = self
            .exceptions
            .iter()
            .all(|e| e.special || !e.overlaps(today, future));

        let holidays_simple = bank_holidays.between(today, future).all(|(_, name)| {
            !self
                .bank_holidays
                .iter()
                .any(|rule| rule.bank_holiday == name)
        });

        exceptions_simple && holidays_simple
    }

    /// One-off extra operating dates worth listing alongside the pattern.
    pub fn special_dates(&self) -> impl Iterator<Item = &CalendarDate> {
        self.exceptions.iter().filter(|e| e.special && e.operation)
    }

    pub fn content_key(&self) -> CalendarKey {
        CalendarKey {
            days: self.days,
            start_date: self.start_date,
            end_date: self.end_date,
            exceptions: self.exceptions.clone(),
            bank_holidays: self.bank_holidays.clone(),
        }
    }

    /// Human description: the summary if there is one, else the weekdays.
    pub fn describe(&self) -> String {
        match &self.summary {
            Some(summary) if !summary.is_empty() => summary.clone(),
            _ => self.days.to_string(),
        }
    }
}
