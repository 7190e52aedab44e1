//! Domain types for the timetable engine.
//!
//! These are the inputs producers hand over: routes, trips, stop times and
//! the calendars that say when trips run. Identifier and time types enforce
//! their invariants at construction, so the grid code can trust them.

mod calendar;
mod ids;
mod route;
mod time;
mod trip;

pub use calendar::{
    BankHolidays, Calendar, CalendarBankHoliday, CalendarDate, CalendarKey, Weekdays,
};
pub use ids::{
    CalendarId, InvalidStopCode, JourneyPatternId, NoteId, RouteId, SourceId, StopCode, TripId,
};
pub use route::{DataSource, Route};
pub use time::{ServiceTime, TimeError};
pub use trip::{Direction, Note, StopTime, TimingStatus, Trip};
