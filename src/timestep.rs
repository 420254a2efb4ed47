//! Calendar grid of a simulation run.
//!
//! A `Timestepper` describes a regular grid (`start`, `end`, `frequency`).
//! It expands into the `Timestep`s handed to parameters and into the
//! `DatetimeIndex` used to align external tables at setup.
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestepError {
    #[error("Invalid frequency '{0}'")]
    InvalidFrequency(String),
    #[error("Invalid date '{0}'")]
    InvalidDate(String),
    #[error("Timestepper end ({end}) is before its start ({start})")]
    EndBeforeStart { start: NaiveDateTime, end: NaiveDateTime },
    #[error("Date arithmetic overflowed")]
    Overflow,
}

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;
/// Mean Gregorian month, used only to rank frequencies.
const SECONDS_PER_MONTH: f64 = 30.436875 * 86_400.0;

/// Spacing of a regular calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    Hours(u32),
    Days(u32),
    /// Calendar months, anchored on the grid's first stamp.
    Months(u32),
}

impl Frequency {
    /// Returns the `k`-th stamp of a grid starting at `origin`.
    pub fn offset(&self, origin: NaiveDateTime, k: usize) -> Option<NaiveDateTime> {
        let k = u32::try_from(k).ok()?;
        match *self {
            Self::Hours(n) => origin.checked_add_signed(Duration::hours(i64::from(n) * i64::from(k))),
            Self::Days(n) => origin.checked_add_signed(Duration::days(i64::from(n) * i64::from(k))),
            Self::Months(n) => origin.checked_add_months(Months::new(n.checked_mul(k)?)),
        }
    }

    /// Approximate length in seconds; months use the mean Gregorian month.
    pub fn nominal_seconds(&self) -> f64 {
        match *self {
            Self::Hours(n) => (i64::from(n) * SECONDS_PER_HOUR) as f64,
            Self::Days(n) => (i64::from(n) * SECONDS_PER_DAY) as f64,
            Self::Months(n) => f64::from(n) * SECONDS_PER_MONTH,
        }
    }

    /// True when samples at `self` are at least as dense as samples at `other`.
    pub fn is_finer_or_equal(&self, other: &Frequency) -> bool {
        self.nominal_seconds() <= other.nominal_seconds()
    }

    /// Infers the frequency of a regular index. `None` for irregular or
    /// single-stamp indexes.
    pub fn infer(stamps: &[NaiveDateTime]) -> Option<Self> {
        if stamps.len() < 2 {
            return None;
        }

        let month_start = stamps
            .iter()
            .all(|t| t.day() == 1 && t.num_seconds_from_midnight() == 0);
        if month_start {
            let months = |t: &NaiveDateTime| i64::from(t.year()) * 12 + i64::from(t.month0());
            let step = months(&stamps[1]) - months(&stamps[0]);
            if step > 0 && stamps.windows(2).all(|w| months(&w[1]) - months(&w[0]) == step) {
                return u32::try_from(step).ok().map(Self::Months);
            }
        }

        let step = (stamps[1] - stamps[0]).num_seconds();
        if step <= 0 || !stamps.windows(2).all(|w| (w[1] - w[0]).num_seconds() == step) {
            return None;
        }
        if step % SECONDS_PER_DAY == 0 {
            u32::try_from(step / SECONDS_PER_DAY).ok().map(Self::Days)
        } else if step % SECONDS_PER_HOUR == 0 {
            u32::try_from(step / SECONDS_PER_HOUR).ok().map(Self::Hours)
        } else {
            None
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hours(n) => write!(f, "{}H", n),
            Self::Days(n) => write!(f, "{}D", n),
            Self::Months(n) => write!(f, "{}MS", n),
        }
    }
}

impl FromStr for Frequency {
    type Err = TimestepError;

    /// Accepts `[n]H`, `[n]D`, `[n]W`, `[n]M` and `[n]MS` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimestepError::InvalidFrequency(s.to_string());
        let trimmed = s.trim().to_ascii_uppercase();
        let split = trimmed.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        let (count, unit) = trimmed.split_at(split);
        let n: u32 = if count.is_empty() { 1 } else { count.parse().map_err(|_| invalid())? };
        if n == 0 {
            return Err(invalid());
        }
        match unit {
            "H" => Ok(Self::Hours(n)),
            "D" => Ok(Self::Days(n)),
            "W" => n.checked_mul(7).map(Self::Days).ok_or_else(invalid),
            "M" | "MS" => Ok(Self::Months(n)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = TimestepError;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self { value.to_string() }
}

/// Parses `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD HH:MM:SS`.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, TimestepError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| TimestepError::InvalidDate(s.to_string()))
}

fn deserialize_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).map_err(serde::de::Error::custom)
}

/// One step of the simulation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestep {
    pub index: usize,
    pub date: NaiveDateTime,
    pub frequency: Frequency,
}

impl Timestep {
    pub fn year(&self) -> i32 { self.date.year() }
    /// Calendar month, 1-12.
    pub fn month(&self) -> u32 { self.date.month() }
    pub fn day(&self) -> u32 { self.date.day() }
    /// Day of year, 1-366.
    pub fn day_of_year(&self) -> u32 { self.date.ordinal() }
    pub fn is_leap_year(&self) -> bool { self.date.date().leap_year() }
}

/// A regular, frequency-tagged sequence of stamps.
#[derive(Debug, Clone, PartialEq)]
pub struct DatetimeIndex {
    pub stamps: Vec<NaiveDateTime>,
    pub frequency: Frequency,
}

impl DatetimeIndex {
    pub fn len(&self) -> usize { self.stamps.len() }
    pub fn is_empty(&self) -> bool { self.stamps.is_empty() }
    pub fn first(&self) -> Option<NaiveDateTime> { self.stamps.first().copied() }
    pub fn last(&self) -> Option<NaiveDateTime> { self.stamps.last().copied() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestepper {
    #[serde(deserialize_with = "deserialize_datetime")]
    pub start: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub end: NaiveDateTime,
    pub frequency: Frequency,
}

impl Timestepper {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, frequency: Frequency) -> Self {
        Self { start, end, frequency }
    }

    /// Every grid stamp in `[start, end]`.
    pub fn datetime_index(&self) -> Result<DatetimeIndex, TimestepError> {
        if self.end < self.start {
            return Err(TimestepError::EndBeforeStart { start: self.start, end: self.end });
        }
        let mut stamps = Vec::new();
        for k in 0.. {
            let t = self.frequency.offset(self.start, k).ok_or(TimestepError::Overflow)?;
            if t > self.end {
                break;
            }
            stamps.push(t);
        }
        Ok(DatetimeIndex { stamps, frequency: self.frequency })
    }

    pub fn timesteps(&self) -> Result<Vec<Timestep>, TimestepError> {
        let index = self.datetime_index()?;
        Ok(index
            .stamps
            .into_iter()
            .enumerate()
            .map(|(index, date)| Timestep { index, date, frequency: self.frequency })
            .collect())
    }
}

#[cfg(test)]
pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("D", Frequency::Days(1))]
    #[case("7D", Frequency::Days(7))]
    #[case("w", Frequency::Days(7))]
    #[case("3H", Frequency::Hours(3))]
    #[case("MS", Frequency::Months(1))]
    #[case("M", Frequency::Months(1))]
    #[case("2ms", Frequency::Months(2))]
    fn test_frequency_parsing(#[case] input: &str, #[case] expected: Frequency) {
        assert_eq!(input.parse::<Frequency>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("0D")]
    #[case("Q")]
    #[case("12")]
    fn test_frequency_parsing_rejects(#[case] input: &str) {
        assert!(input.parse::<Frequency>().is_err(), "Should fail: '{}'", input);
    }

    #[test]
    fn test_frequency_ordering() {
        assert!(Frequency::Days(1).is_finer_or_equal(&Frequency::Months(1)));
        assert!(Frequency::Days(1).is_finer_or_equal(&Frequency::Days(1)));
        assert!(Frequency::Hours(6).is_finer_or_equal(&Frequency::Days(1)));
        assert!(!Frequency::Months(1).is_finer_or_equal(&Frequency::Days(7)));
    }

    #[test]
    fn test_monthly_grid_is_anchored_on_start() {
        let stepper = Timestepper::new(date(2000, 1, 1), date(2000, 12, 1), Frequency::Months(1));
        let steps = stepper.timesteps().unwrap();
        assert_eq!(steps.len(), 12);
        assert_eq!(steps[1].date, date(2000, 2, 1));
        assert_eq!(steps[11].month(), 12);
        assert_eq!(steps[11].index, 11);
    }

    #[test]
    fn test_end_before_start() {
        let stepper = Timestepper::new(date(2001, 1, 1), date(2000, 1, 1), Frequency::Days(1));
        assert!(matches!(stepper.timesteps(), Err(TimestepError::EndBeforeStart { .. })));
    }

    #[test]
    fn test_infer_frequency() {
        let daily: Vec<_> = (1..=5).map(|d| date(2000, 1, d)).collect();
        assert_eq!(Frequency::infer(&daily), Some(Frequency::Days(1)));

        let monthly: Vec<_> = (1..=4).map(|m| date(2000, m, 1)).collect();
        assert_eq!(Frequency::infer(&monthly), Some(Frequency::Months(1)));

        let irregular = vec![date(2000, 1, 1), date(2000, 1, 2), date(2000, 1, 5)];
        assert_eq!(Frequency::infer(&irregular), None);
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert_eq!(parse_datetime("2000-03-04").unwrap(), date(2000, 3, 4));
        assert_eq!(
            parse_datetime("2000-03-04T06:00:00").unwrap(),
            date(2000, 3, 4) + Duration::hours(6)
        );
        assert!(parse_datetime("04/03/2000").is_err());
    }
}
