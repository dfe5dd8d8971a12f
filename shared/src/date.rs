//! Calendar dates
//!
//! Routes are scheduled by calendar day, so everything here works on
//! `NaiveDate`:
//! - `Clock`: where "today" comes from (system local time, or a fixed day in tests)
//! - `parse_calendar_date`: accepts `YYYY-MM-DD` and timestamps, keeping only the day
//! - `format_date`: the `dd/MM/yyyy` form shown to users

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Wire format of date columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Display format used on route cards.
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";

// =========================================================
// Clock - source of the current calendar day
// =========================================================

/// Supplies the current calendar day.
///
/// Read fresh on every fetch and classification, since the day can roll
/// over while a screen stays open.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock day of the device.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

// =========================================================
// Parsing & formatting
// =========================================================

/// Parses a calendar date, dropping any time-of-day component.
///
/// Accepts `2024-06-10`, RFC 3339 (`2024-06-10T08:30:00-03:00`) and
/// offset-less timestamps (`2024-06-10T08:30:00`). Returns `None` if the
/// string is none of these.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|ts| ts.date())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

pub fn to_iso(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Serde adapter for nullable date columns.
pub mod optional_calendar_date {
    use super::{parse_calendar_date, to_iso};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_some(&to_iso(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse_calendar_date(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid calendar date '{}'", raw))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(parse_calendar_date("2024-06-10"), Some(ymd(2024, 6, 10)));
    }

    #[test]
    fn test_parse_strips_time_of_day() {
        assert_eq!(
            parse_calendar_date("2024-06-10T23:59:59-03:00"),
            Some(ymd(2024, 6, 10))
        );
        assert_eq!(
            parse_calendar_date("2024-06-10T00:00:00.123"),
            Some(ymd(2024, 6, 10))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_calendar_date(""), None);
        assert_eq!(parse_calendar_date("2024-02-30"), None);
        assert_eq!(parse_calendar_date("amanhã"), None);
    }

    #[test]
    fn test_format_date_brazilian_order() {
        assert_eq!(format_date(ymd(2024, 6, 9)), "09/06/2024");
        assert_eq!(to_iso(ymd(2024, 6, 9)), "2024-06-09");
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(ymd(2024, 6, 10));
        assert_eq!(clock.today(), ymd(2024, 6, 10));
    }
}
