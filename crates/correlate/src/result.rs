//! The output of a correlation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::correlator::RankingApproach;

/// One matched pair of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatorMatch<V> {
    pub value_a: V,
    pub value_b: V,
    pub score: f64,
}

/// Wall-clock time spent in each correlate pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassTimings {
    pub streamline: Duration,
    pub candidates: Duration,
    pub fuzzy_subtotals: Duration,
    pub scoring: Duration,
    pub boiling: Duration,
    pub finalize: Duration,
    pub elapsed: Duration,
}

/// Diagnostics about a correlation run. Not part of the matching contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelateStatistics {
    /// Value pairs that shared at least one key.
    pub candidate_pairs: usize,
    /// Fuzzy comparisons performed (cache misses) during this run.
    pub fuzzy_comparisons: usize,
    /// Matches above the minimum score in the chosen stream, before boiling.
    pub scored_matches: usize,
    /// Tie hypotheses explored while boiling all streams.
    pub boiler_hypotheses: usize,
    /// Ranking approach whose stream produced the result.
    pub ranking_used: RankingApproach,
    pub timings: PassTimings,
}

/// Matches plus the values left unmatched on each side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatorResult<V> {
    /// Highest score first.
    pub matches: Vec<CorrelatorMatch<V>>,
    /// Unmatched values of dataset A, in insertion order.
    pub unmatched_a: Vec<V>,
    /// Unmatched values of dataset B, in insertion order.
    pub unmatched_b: Vec<V>,
    pub minimum_score: f64,
    pub statistics: CorrelateStatistics,
}

impl<V> CorrelatorResult<V> {
    /// Sum of all match scores.
    pub fn total_score(&self) -> f64 {
        self.matches.iter().map(|m| m.score).sum()
    }

    /// Rescale match scores to `(score - low) / (high - low)`.
    ///
    /// `high` defaults to the best match's score and `low` to the minimum
    /// score the result was produced with. Does nothing when there are no
    /// matches or `high == low`.
    pub fn normalize(&mut self, high: Option<f64>, low: Option<f64>) {
        let Some(top) = self.matches.first() else {
            return;
        };
        let high = high.unwrap_or(top.score);
        let low = low.unwrap_or(self.minimum_score);
        let delta = high - low;
        if delta == 0.0 {
            return;
        }
        for m in &mut self.matches {
            m.score = (m.score - low) / delta;
        }
    }
}
