//! Temporal representations
//!
//! Calendar values are backed by chrono's naive types. The "count since epoch"
//! types are plain integer offsets from the first day of 1960, 1970 or 1980;
//! conversions between epochs add a fixed offset and never reparse text.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Day number (from the common era) of 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Reference year of a "since epoch" count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Epoch {
    Y1960,
    Y1970,
    Y1980,
}

impl Epoch {
    pub const ALL: [Epoch; 3] = [Epoch::Y1960, Epoch::Y1970, Epoch::Y1980];

    pub fn year(&self) -> i32 {
        match self {
            Self::Y1960 => 1960,
            Self::Y1970 => 1970,
            Self::Y1980 => 1980,
        }
    }

    /// Signed day distance from 1970-01-01 to January 1st of this epoch
    pub fn days_from_unix(&self) -> i64 {
        match self {
            Self::Y1960 => -3653,
            Self::Y1970 => 0,
            Self::Y1980 => 3652,
        }
    }

    /// Number of days to add to a count since `self` to get a count since `target`
    pub fn day_offset_to(&self, target: Epoch) -> i64 {
        self.days_from_unix() - target.days_from_unix()
    }

    /// Number of seconds to add to a count since `self` to get a count since `target`
    pub fn second_offset_to(&self, target: Epoch) -> i64 {
        self.day_offset_to(target) * SECONDS_PER_DAY
    }

    /// Look up an epoch by its reference year
    pub fn from_year(year: i32) -> Option<Epoch> {
        Self::ALL.into_iter().find(|epoch| epoch.year() == year)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.year())
    }
}

fn days_from_unix(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
}

/// Days elapsed from the epoch to `date`
pub fn days_since(epoch: Epoch, date: NaiveDate) -> i64 {
    days_from_unix(date) - epoch.days_from_unix()
}

/// Calendar date `days` after the epoch
pub fn date_from_days(epoch: Epoch, days: i64) -> Option<NaiveDate> {
    let from_ce = days
        .checked_add(epoch.days_from_unix())?
        .checked_add(UNIX_EPOCH_DAYS_FROM_CE)?;
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(from_ce).ok()?)
}

/// Whole seconds elapsed from the epoch to `date_time`; fractional seconds are dropped
pub fn seconds_since(epoch: Epoch, date_time: NaiveDateTime) -> i64 {
    days_since(epoch, date_time.date()) * SECONDS_PER_DAY
        + i64::from(date_time.time().num_seconds_from_midnight())
}

/// Date-time `seconds` after the epoch
pub fn date_time_from_seconds(epoch: Epoch, seconds: i64) -> Option<NaiveDateTime> {
    let date = date_from_days(epoch, seconds.div_euclid(SECONDS_PER_DAY))?;
    let time = time_from_seconds(seconds.rem_euclid(SECONDS_PER_DAY))?;
    Some(date.and_time(time))
}

/// Time of day for a count of seconds since midnight (must be below one day)
pub fn time_from_seconds(seconds: i64) -> Option<NaiveTime> {
    let seconds = u32::try_from(seconds).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
}

pub fn seconds_since_midnight(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight())
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M:%S%.f").ok()
}

/// Parse a date-time; the separator may be `T` or a space, and a bare date means midnight
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| parse_date(text).map(|date| date.and_time(NaiveTime::MIN)))
}

/// Parse an elapsed time of the form `H:MM:SS`
///
/// Hours are not limited to a single day, so `36:00:00` is 129600 seconds.
/// A leading minus sign negates the whole duration.
pub fn parse_elapsed_seconds(text: &str) -> Option<i64> {
    let text = text.trim();
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text),
    };

    let mut parts = body.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return None;
    }

    Some(sign * (hours * 3600 + minutes * 60 + seconds))
}

/// Format an elapsed time as `H:MM:SS`
pub fn format_elapsed_seconds(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let total = seconds.unsigned_abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_epoch_offsets_match_calendar() {
        for epoch in Epoch::ALL {
            assert_eq!(days_since(epoch, date(epoch.year(), 1, 1)), 0);
        }
        assert_eq!(days_since(Epoch::Y1960, date(1970, 1, 1)), 3653);
        assert_eq!(days_since(Epoch::Y1970, date(1980, 1, 1)), 3652);
    }

    #[test]
    fn test_epoch_conversion() {
        let d = date(2003, 4, 1);
        let since_1960 = days_since(Epoch::Y1960, d);
        let since_1980 = days_since(Epoch::Y1980, d);
        assert_eq!(since_1960 + Epoch::Y1960.day_offset_to(Epoch::Y1980), since_1980);
        assert_eq!(date_from_days(Epoch::Y1980, since_1980), Some(d));
    }

    #[test]
    fn test_seconds_round_trip() {
        let dt = date(1960, 1, 3).and_hms_opt(3, 30, 3).unwrap();
        let seconds = seconds_since(Epoch::Y1960, dt);
        assert_eq!(seconds, 2 * SECONDS_PER_DAY + 3 * 3600 + 30 * 60 + 3);
        assert_eq!(date_time_from_seconds(Epoch::Y1960, seconds), Some(dt));
    }

    #[test]
    fn test_negative_seconds() {
        let dt = date(1959, 12, 31).and_hms_opt(23, 59, 59).unwrap();
        assert_eq!(seconds_since(Epoch::Y1960, dt), -1);
        assert_eq!(date_time_from_seconds(Epoch::Y1960, -1), Some(dt));
    }

    #[test]
    fn test_parse_date_time() {
        let expected = date(2020, 2, 29).and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(parse_date_time("2020-02-29T12:00:00"), Some(expected));
        assert_eq!(parse_date_time("2020-02-29 12:00:00"), Some(expected));
        assert_eq!(
            parse_date_time("2020-02-29"),
            Some(date(2020, 2, 29).and_time(NaiveTime::MIN))
        );
        assert_eq!(parse_date_time("2021-02-29"), None);
    }

    #[test]
    fn test_elapsed_seconds() {
        assert_eq!(parse_elapsed_seconds("36:00:00"), Some(129_600));
        assert_eq!(parse_elapsed_seconds("0:01:05"), Some(65));
        assert_eq!(parse_elapsed_seconds("-1:00:00"), Some(-3600));
        assert_eq!(parse_elapsed_seconds("1:60:00"), None);
        assert_eq!(parse_elapsed_seconds("1:00"), None);
        assert_eq!(format_elapsed_seconds(129_600), "36:00:00");
        assert_eq!(format_elapsed_seconds(-65), "-0:01:05");
    }
}
