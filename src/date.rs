use std::fmt;
use std::str::FromStr;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// A calendar day ("YYYY-MM-DD"), interpreted as midnight UTC when used as a bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(Date);

impl Day {
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, String> {
        let month = time::Month::try_from(month).map_err(|e| e.to_string())?;
        Date::from_calendar_date(year, month, day).map(Day).map_err(|e| e.to_string())
    }

    pub const fn from_date(date: Date) -> Self {
        Day(date)
    }

    /// Unix seconds at 00:00:00 UTC of this day.
    pub fn unix_timestamp(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp()
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.0;
        write!(f, "{:04}-{:02}-{:02}", d.year(), d.month() as u8, d.day())
    }
}

impl FromStr for Day {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
            .map(Day)
            .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
    }
}

fn datetime(ts: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(ts).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// `YYYY-MM-DD` (UTC) for a Unix timestamp.
pub fn format_day(ts: i64) -> String {
    datetime(ts)
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// `YYYY-MM-DD HH:MM:SS` (UTC) for a Unix timestamp.
pub fn format_datetime(ts: i64) -> String {
    datetime(ts)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_default()
}
