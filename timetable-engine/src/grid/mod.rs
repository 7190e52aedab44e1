//! Timetable grid assembly.
//!
//! This module turns an unordered set of trips into a grid of rows (stops)
//! by columns (trips):
//!
//! - [`rows`] lays out one row per stop, topologically when the stop graph
//!   allows it and by incremental diffing ([`diff`](mod@diff)) when it doesn't
//! - [`columns`] orders trips so times increase along each row
//! - [`merge`] rejoins workings split across routes before assembly
//! - [`annotate`] labels column runs and abbreviates repeating trips
//!
//! Every step keeps the grid rectangular: each row has one cell per column.

pub mod annotate;
mod cell;
pub mod columns;
pub mod diff;
mod error;
mod grouping;
pub mod merge;
mod row;
pub mod rows;

pub use annotate::{ColumnFoot, ColumnHead, interval_allowed};
pub use cell::{Cell, Repetition, TimeCell};
pub use diff::{Op, diff};
pub use error::{CycleDetected, GridError};
pub use grouping::{Grouping, GroupingOptions};
pub use merge::merge_split_trips;
pub use row::Row;
pub use rows::RowOrdering;
