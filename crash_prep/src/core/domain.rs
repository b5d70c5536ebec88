//! Domain models for collision records.
//!
//! This module provides the small value types the cleaning and labeling
//! stages reason about: the regional bounding box used to reject bad
//! geocoordinates, the ordinal cyclist outcome, and crash timestamp parsing.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Regional bounding box for plausible collision coordinates.
///
/// A coordinate pair is rejected when its latitude falls below
/// `min_latitude` or its longitude rises above `max_longitude`. There is no
/// upper latitude or lower longitude limit.
///
/// # Examples
///
/// ```
/// use crash_prep::core::domain::GeoBounds;
///
/// let bounds = GeoBounds::default();
/// assert!(bounds.is_plausible(Some(40.7), Some(-73.9)));
/// assert!(!bounds.is_plausible(Some(0.0), Some(0.0)));
/// // A missing coordinate never fails the check on its own.
/// assert!(bounds.is_plausible(None, Some(-73.9)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_latitude: f64,
    pub max_longitude: f64,
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self {
            min_latitude: 35.0,
            max_longitude: -65.0,
        }
    }
}

impl GeoBounds {
    /// Returns `false` when either coordinate is out of bounds.
    ///
    /// Comparisons against a missing value are false, so a row with one
    /// missing coordinate is judged on the other alone.
    pub fn is_plausible(&self, latitude: Option<f64>, longitude: Option<f64>) -> bool {
        let bad_latitude = latitude.is_some_and(|lat| lat < self.min_latitude);
        let bad_longitude = longitude.is_some_and(|lon| lon > self.max_longitude);
        !(bad_latitude || bad_longitude)
    }
}

/// Ordinal cyclist injury outcome.
///
/// Stored in the feature matrix as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    NoInjury,
    Injury,
    Fatality,
}

impl Outcome {
    /// Integer code used in the `outcome` column.
    pub fn code(self) -> i32 {
        match self {
            Outcome::NoInjury => 0,
            Outcome::Injury => 1,
            Outcome::Fatality => 2,
        }
    }

    /// Labels a record from its cyclist counts.
    ///
    /// The three masks are applied in order and each later match overwrites
    /// the earlier one, so a fatality always wins. A row matching no mask
    /// (missing injured count and no fatality) stays unlabeled.
    ///
    /// # Examples
    ///
    /// ```
    /// use crash_prep::core::domain::Outcome;
    ///
    /// assert_eq!(Outcome::from_counts(Some(0), Some(0)), Some(Outcome::NoInjury));
    /// assert_eq!(Outcome::from_counts(Some(2), Some(0)), Some(Outcome::Injury));
    /// assert_eq!(Outcome::from_counts(Some(1), Some(1)), Some(Outcome::Fatality));
    /// assert_eq!(Outcome::from_counts(Some(0), Some(1)), Some(Outcome::Fatality));
    /// assert_eq!(Outcome::from_counts(None, Some(0)), None);
    /// ```
    pub fn from_counts(injured: Option<i64>, killed: Option<i64>) -> Option<Self> {
        let mut outcome = None;

        if injured == Some(0) {
            outcome = Some(Outcome::NoInjury);
        }
        if injured.is_some_and(|n| n > 0) {
            outcome = Some(Outcome::Injury);
        }
        if killed.is_some_and(|n| n > 0) {
            outcome = Some(Outcome::Fatality);
        }

        outcome
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses a crash date and time pair into a single timestamp.
///
/// The two fields are joined with a space and tried against the layouts the
/// collision exports use (`09/11/2021` or `2021-09-11` dates, `2:39` or
/// `14:05:00` times). Socrata API exports carry an ISO date with a zeroed
/// `T00:00:00.000` suffix; that suffix is discarded in favour of the time
/// field.
///
/// # Examples
///
/// ```
/// use crash_prep::core::domain::parse_crash_timestamp;
///
/// let ts = parse_crash_timestamp("09/11/2021", "2:39").unwrap();
/// assert_eq!(ts.to_string(), "2021-09-11 02:39:00");
///
/// let iso = parse_crash_timestamp("2021-09-11T00:00:00.000", "14:05").unwrap();
/// assert_eq!(iso.to_string(), "2021-09-11 14:05:00");
///
/// assert!(parse_crash_timestamp("not a date", "2:39").is_none());
/// ```
pub fn parse_crash_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    let time = time.trim();

    let joined = format!("{} {}", date, time);
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&joined, format) {
            return Some(ts);
        }
    }

    let (day, _) = date.split_once('T')?;
    let day = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
    let clock = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;
    Some(day.and_time(clock))
}
