//! Calendar dates that match when a few days apart.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::key::FuzzyComparable;

/// A date compared by distance in days.
///
/// Same day scores 1.0, each day apart up to five costs 0.15, six to eight
/// days apart (a weekly show slipping a slot) scores 0.25, and anything
/// further scores 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for DateKey {
    type Err = chrono::ParseError;

    /// Parse an ISO `YYYY-MM-DD` date.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(Self)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FuzzyComparable for DateKey {
    fn compare(&self, other: &Self) -> Option<f64> {
        let days = (self.0 - other.0).num_days().unsigned_abs();
        let score = match days {
            0..=5 => 1.0 - days as f64 * 0.15,
            6..=8 => 0.25,
            _ => 0.0,
        };
        Some(score)
    }
}
