//! Timetable assembly engine.
//!
//! Turns an unordered set of public-transport trips into a grid a person can
//! read: one row per stop, one column per trip, with split workings merged
//! and frequent services abbreviated to "then every N minutes until".

pub mod calendar;
pub mod config;
pub mod domain;
pub mod grid;
pub mod timetable;

pub use config::TimetableConfig;
pub use timetable::{Timetable, TimetableBuilder, TimetableError, TimetableRequest};
