use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("'{0}' is not a valid HH:MM time")]
    InvalidTime(String),

    #[error("'{0}' is not a valid ISO date")]
    InvalidDate(String),
}

fn hh_mm_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([01]?[0-9]|2[0-3]):([0-5][0-9])$").expect("static time pattern compiles")
    })
}

/// Wall-clock time of day at minute precision, always rendered as
/// zero-padded `HH:MM`. Ordering matches chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(SlotTime)
    }

    /// Accepts `H:MM` or `HH:MM` on a 24-hour clock.
    pub fn parse(raw: &str) -> Result<Self, TimeParseError> {
        let trimmed = raw.trim();
        let captures = hh_mm_pattern()
            .captures(trimmed)
            .ok_or_else(|| TimeParseError::InvalidTime(raw.to_string()))?;

        let hour: u32 = captures[1]
            .parse()
            .map_err(|_| TimeParseError::InvalidTime(raw.to_string()))?;
        let minute: u32 = captures[2]
            .parse()
            .map_err(|_| TimeParseError::InvalidTime(raw.to_string()))?;

        SlotTime::new(hour, minute).ok_or_else(|| TimeParseError::InvalidTime(raw.to_string()))
    }

    /// Adds minutes on a 24-hour clock face; 23:45 + 30 is 00:15.
    pub fn plus_minutes(self, minutes: i64) -> Self {
        let (time, _) = self.0.overflowing_add_signed(Duration::minutes(minutes));
        SlotTime(time)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for SlotTime {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlotTime::parse(s)
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SlotTime::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parses `YYYY-MM-DD`, or an RFC 3339 timestamp reduced to its UTC date.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, TimeParseError> {
    let trimmed = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| TimeParseError::InvalidDate(raw.to_string()))
}

/// 0 = Sunday through 6 = Saturday.
pub fn weekday_name(day_of_week: u8) -> &'static str {
    WEEKDAY_NAMES.get(day_of_week as usize).copied().unwrap_or("Unknown")
}
