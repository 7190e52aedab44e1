//! Which calendars, and so which trips, a timetable shows.

mod cache;
mod resolve;

pub use cache::CalendarCache;
pub use resolve::{CalendarOption, CalendarResolver, CalendarSelection};
