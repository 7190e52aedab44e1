//! Render configuration.

use chrono::Duration;
use chrono_tz::Tz;

/// Error reading configuration from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be true or false, got {value:?}")]
    InvalidBool { name: &'static str, value: String },

    #[error("unknown time zone {0:?}")]
    InvalidTimezone(String),
}

/// Configuration parameters for timetable rendering.
#[derive(Debug, Clone)]
pub struct TimetableConfig {
    /// Maximum number of trips one render may assemble.
    /// Larger requests are refused so the caller can narrow the date.
    pub max_trips: usize,

    /// How far ahead a calendar must be free of exceptions (days)
    /// to be shown as a plain weekly pattern.
    pub simple_lookahead_days: i64,

    /// How many days of date options to offer (days).
    pub date_window_days: i64,

    /// Largest gap between two halves of a split working (minutes).
    pub merge_max_gap_mins: i64,

    /// Whether hourly services may be abbreviated to "then every hour".
    pub hourly_abbreviation: bool,

    /// Local time zone of the timetables.
    pub timezone: Tz,
}

impl TimetableConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        max_trips: usize,
        simple_lookahead_days: i64,
        date_window_days: i64,
        merge_max_gap_mins: i64,
        hourly_abbreviation: bool,
        timezone: Tz,
    ) -> Self {
        Self {
            max_trips,
            simple_lookahead_days,
            date_window_days,
            merge_max_gap_mins,
            hourly_abbreviation,
            timezone,
        }
    }

    /// Defaults overridden by `TIMETABLE_*` environment variables.
    ///
    /// Recognised: `TIMETABLE_MAX_TRIPS`, `TIMETABLE_SIMPLE_LOOKAHEAD_DAYS`,
    /// `TIMETABLE_DATE_WINDOW_DAYS`, `TIMETABLE_MERGE_MAX_GAP_MINS`,
    /// `TIMETABLE_HOURLY_ABBREVIATION` and `TIMETABLE_TIMEZONE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("TIMETABLE_MAX_TRIPS") {
            config.max_trips = parse_number("TIMETABLE_MAX_TRIPS", &value)? as usize;
        }
        if let Some(value) = lookup("TIMETABLE_SIMPLE_LOOKAHEAD_DAYS") {
            config.simple_lookahead_days = parse_number("TIMETABLE_SIMPLE_LOOKAHEAD_DAYS", &value)?;
        }
        if let Some(value) = lookup("TIMETABLE_DATE_WINDOW_DAYS") {
            config.date_window_days = parse_number("TIMETABLE_DATE_WINDOW_DAYS", &value)?;
        }
        if let Some(value) = lookup("TIMETABLE_MERGE_MAX_GAP_MINS") {
            config.merge_max_gap_mins = parse_number("TIMETABLE_MERGE_MAX_GAP_MINS", &value)?;
        }
        if let Some(value) = lookup("TIMETABLE_HOURLY_ABBREVIATION") {
            config.hourly_abbreviation = match value.trim() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::InvalidBool {
                        name: "TIMETABLE_HOURLY_ABBREVIATION",
                        value,
                    });
                }
            };
        }
        if let Some(value) = lookup("TIMETABLE_TIMEZONE") {
            config.timezone = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimezone(value.clone()))?;
        }

        Ok(config)
    }

    /// Returns the simplicity lookahead as a Duration.
    pub fn simple_lookahead(&self) -> Duration {
        Duration::days(self.simple_lookahead_days)
    }

    /// Returns the date option window as a Duration.
    pub fn date_window(&self) -> Duration {
        Duration::days(self.date_window_days)
    }

    /// Returns the largest split-working gap as a Duration.
    pub fn merge_max_gap(&self) -> Duration {
        Duration::minutes(self.merge_max_gap_mins)
    }
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            max_trips: 1500,
            simple_lookahead_days: 28,
            date_window_days: 21,
            merge_max_gap_mins: 15,
            hourly_abbreviation: false,
            timezone: chrono_tz::Europe::London,
        }
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .map(i64::from)
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}
