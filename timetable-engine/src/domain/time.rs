//! Service-day time handling.
//!
//! Timetable feeds give times as offsets from midnight of the day a trip
//! starts, and those offsets may exceed 24 hours for trips that run past
//! midnight ("25:10" is ten past one the following morning). `ServiceTime`
//! keeps the offset rather than a wall-clock time so that a 23:50 → 00:15
//! journey still sorts and subtracts correctly.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Offset from midnight of the service day, in whole seconds.
///
/// # Examples
///
/// ```
/// use timetable_engine::domain::ServiceTime;
///
/// let t = ServiceTime::parse("25:10").unwrap();
/// assert_eq!(t.to_string(), "01:10");
/// assert!(t.is_after_midnight());
/// ```
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Midnight at the start of the service day.
    pub const MIDNIGHT: ServiceTime = ServiceTime(0);

    /// One full day, the offset at which post-midnight running begins.
    pub const ONE_DAY: ServiceTime = ServiceTime(SECONDS_PER_DAY);

    pub fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Parse `HH:MM` or `HH:MM:SS`. Hours above 23 are allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use timetable_engine::domain::ServiceTime;
    ///
    /// assert!(ServiceTime::parse("07:30").is_ok());
    /// assert!(ServiceTime::parse("26:00:00").is_ok());
    /// assert!(ServiceTime::parse("7:30").is_err());
    /// assert!(ServiceTime::parse("07:60").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();

        if bytes.len() != 5 && bytes.len() != 8 {
            return Err(TimeError::new("expected HH:MM or HH:MM:SS format"));
        }
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hours =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minutes = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let seconds = if bytes.len() == 8 {
            if bytes[5] != b':' {
                return Err(TimeError::new("expected colon at position 5"));
            }
            let seconds = parse_two_digits(&bytes[6..8])
                .ok_or_else(|| TimeError::new("invalid second digits"))?;
            if seconds > 59 {
                return Err(TimeError::new("second must be 0-59"));
            }
            seconds
        } else {
            0
        };

        Ok(Self::from_hms(hours, minutes, seconds))
    }

    pub fn as_secs(&self) -> u32 {
        self.0
    }

    /// Hours since the start of the service day (may exceed 23).
    pub fn hours(&self) -> u32 {
        self.0 / 3600
    }

    /// Minutes past the hour.
    pub fn minute(&self) -> u32 {
        (self.0 / 60) % 60
    }

    /// Wall-clock hour (0-23).
    pub fn hour(&self) -> u32 {
        self.hours() % 24
    }

    /// True when the offset falls on the following calendar day.
    pub fn is_after_midnight(&self) -> bool {
        self.0 >= SECONDS_PER_DAY
    }

    pub fn as_duration(&self) -> Duration {
        Duration::seconds(i64::from(self.0))
    }

    /// Add a duration, returning `None` on underflow or overflow.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        let secs = i64::from(self.0).checked_add(duration.num_seconds())?;
        u32::try_from(secs).ok().map(Self)
    }

    /// Returns the duration between two times.
    ///
    /// Returns a negative duration if `other` is after `self`.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        Duration::seconds(i64::from(self.0) - i64::from(other.0))
    }
}

impl Sub for ServiceTime {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.signed_duration_since(rhs)
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ServiceTime({:02}:{:02}:{:02})",
            self.hours(),
            self.minute(),
            self.0 % 60
        )
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}
