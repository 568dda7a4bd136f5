//! The scoring passes behind [`Correlator::correlate`](crate::Correlator::correlate).
//!
//! 1. [`streamline`]: flatten each value's keys into per-round tables.
//! 2. [`candidates`]: find value pairs sharing an exact key or a positively
//!    scored fuzzy key pair.
//! 3. [`fuzzy`]: boil each pair's fuzzy key pairings and accumulate the
//!    per-key-round totals used to normalize them.
//! 4. [`pair`] and [`ranking`]: score each pair and fan it out into one
//!    stream per ranking approach in play.

pub(crate) mod candidates;
pub(crate) mod fuzzy;
pub(crate) mod pair;
pub(crate) mod ranking;
pub(crate) mod streamline;

pub(crate) use candidates::{FuzzyScores, exact_candidates, fuzzy_candidates};
pub(crate) use fuzzy::{FuzzyHits, fuzzy_subtotals};
pub(crate) use pair::{PairInputs, score_pair};
pub(crate) use ranking::RankingModel;
pub(crate) use streamline::{Streamlined, fuzzy_type_order};
