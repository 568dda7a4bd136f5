//! Episode numbers, optionally flagged as specials (`s12`).

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::key::FuzzyComparable;

/// An episode number compared by distance.
///
/// Regular episodes and specials never match each other on the same number:
/// `s10` against `10` scores 0, not 1, even though both carry the number 10.
/// A special is a different episode from the regular one sharing its number.
/// Otherwise the score falls by 0.2 per episode apart, reaching 0 at five,
/// and the flag is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeKey {
    pub number: u32,
    pub special: bool,
}

impl EpisodeKey {
    pub fn new(number: u32) -> Self {
        Self { number, special: false }
    }

    pub fn special(number: u32) -> Self {
        Self { number, special: true }
    }
}

impl FromStr for EpisodeKey {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix('s') {
            Some(number) => Ok(Self::special(number.parse()?)),
            None => Ok(Self::new(s.parse()?)),
        }
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.special {
            write!(f, "s{}", self.number)
        } else {
            write!(f, "{}", self.number)
        }
    }
}

impl FuzzyComparable for EpisodeKey {
    fn compare(&self, other: &Self) -> Option<f64> {
        let delta = self.number.abs_diff(other.number);
        let score = if delta == 0 {
            if self.special == other.special { 1.0 } else { 0.0 }
        } else if delta >= 5 {
            0.0
        } else {
            1.0 - f64::from(delta) / 5.0
        };
        Some(score)
    }
}
