//! Identifier types.
//!
//! Each identifier is its own type so a route id can never be passed where a
//! trip id is expected. Producers hand these over as plain strings; `StopCode`
//! additionally rejects empty and padded codes because it is the key every
//! stop-sequence comparison is made on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when parsing an invalid stop code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop code: {reason}")]
pub struct InvalidStopCode {
    reason: &'static str,
}

/// Identity of a stop, used as the key when aligning stop sequences.
///
/// Usually an ATCO code or GTFS `stop_id`. Any non-empty string without
/// surrounding whitespace is accepted.
///
/// # Examples
///
/// ```
/// use timetable_engine::domain::StopCode;
///
/// let stop = StopCode::parse("490000077E").unwrap();
/// assert_eq!(stop.as_str(), "490000077E");
///
/// assert!(StopCode::parse("").is_err());
/// assert!(StopCode::parse(" 0100BRP90312").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopCode(String);

impl StopCode {
    pub fn parse(s: &str) -> Result<Self, InvalidStopCode> {
        if s.is_empty() {
            return Err(InvalidStopCode {
                reason: "must not be empty",
            });
        }
        if s.trim() != s {
            return Err(InvalidStopCode {
                reason: "must not have leading or trailing whitespace",
            });
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StopCode {
    type Error = InvalidStopCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StopCode> for String {
    fn from(value: StopCode) -> Self {
        value.0
    }
}

impl fmt::Debug for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopCode({})", self.0)
    }
}

impl fmt::Display for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a route within its data source.
    RouteId
);
string_id!(
    /// Identifier of a single trip (vehicle working).
    TripId
);
string_id!(
    /// Identifier of an operating calendar.
    CalendarId
);
string_id!(
    /// Identifier of a footnote attached to trips or stop times.
    NoteId
);
string_id!(
    /// Identifier of the feed a route was imported from.
    SourceId
);
string_id!(
    /// Identifier of a journey pattern (an ordered stop sequence shared by trips).
    JourneyPatternId
);
