//! The correlation driver.

use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::boil::{Match, MatchBoiler, Reuse, sort_matches};
use crate::dataset::{Dataset, ValueId};
use crate::error::{CorrelateError, Result};
use crate::result::{CorrelateStatistics, CorrelatorMatch, CorrelatorResult, PassTimings};
use crate::scoring::{
    FuzzyHits, FuzzyScores, PairInputs, RankingModel, Streamlined, exact_candidates, fuzzy_candidates,
    fuzzy_subtotals, fuzzy_type_order, score_pair,
};

/// How rankings influence which matches are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingApproach {
    /// Ignore rankings.
    NotUsed,
    /// Try both absolute and relative rankings and keep the better result.
    #[default]
    Best,
    /// Compare raw ranking distances.
    Absolute,
    /// Compare rankings normalized within each dataset.
    Relative,
}

impl std::fmt::Display for RankingApproach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RankingApproach::NotUsed => "not used",
            RankingApproach::Best => "best",
            RankingApproach::Absolute => "absolute",
            RankingApproach::Relative => "relative",
        };
        f.write_str(name)
    }
}

/// Options for a correlation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelateOptions {
    /// Matches must score strictly above this to be kept.
    pub minimum_score: f64,
    /// Weight of the matched/total key ratio bonus. 0 disables it.
    pub score_ratio_bonus: f64,
    pub ranking: RankingApproach,
    /// Added to scores in proportion to how well rankings agree.
    pub ranking_bonus: f64,
    /// Fraction of each score that depends on how well rankings agree.
    pub ranking_factor: f64,
    /// Allow a value of dataset A in more than one match.
    pub reuse_a: bool,
    /// Allow a value of dataset B in more than one match.
    pub reuse_b: bool,
}

impl Default for CorrelateOptions {
    fn default() -> Self {
        Self {
            minimum_score: 0.0,
            score_ratio_bonus: 1.0,
            ranking: RankingApproach::Best,
            ranking_bonus: 0.0,
            ranking_factor: 0.0,
            reuse_a: false,
            reuse_b: false,
        }
    }
}

impl CorrelateOptions {
    /// Check for option combinations that cannot be honored.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("minimum_score", self.minimum_score),
            ("score_ratio_bonus", self.score_ratio_bonus),
            ("ranking_bonus", self.ranking_bonus),
            ("ranking_factor", self.ranking_factor),
        ] {
            if !value.is_finite() {
                return Err(CorrelateError::Config(format!("{name} must be a finite number, got {value}")));
            }
        }
        if self.minimum_score < 0.0 {
            return Err(CorrelateError::Config(format!(
                "minimum_score must not be negative, got {}",
                self.minimum_score
            )));
        }
        if self.ranking_bonus != 0.0 && self.ranking_factor != 0.0 {
            return Err(CorrelateError::Config(
                "ranking_bonus and ranking_factor cannot be used together".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reuse(&self) -> Reuse {
        Reuse::new(self.reuse_a, self.reuse_b)
    }
}

/// Scored matches for one ranking approach.
struct Stream {
    approach: RankingApproach,
    matches: Vec<Match<ValueId, ValueId>>,
}

impl Stream {
    fn new(approach: RankingApproach) -> Self {
        Self {
            approach,
            matches: Vec::new(),
        }
    }
}

/// A boiled stream.
struct Outcome {
    approach: RankingApproach,
    total: f64,
    kept: Vec<Match<ValueId, ValueId>>,
    seen_a: HashSet<ValueId>,
    seen_b: HashSet<ValueId>,
    scored: usize,
}

/// Finds the best conflict-free pairing between two datasets.
///
/// # Example
///
/// ```
/// use correlate::{CorrelateOptions, Correlator};
///
/// let mut correlator = Correlator::new();
/// correlator.dataset_a_mut().set_keys(["the", "matrix"], "The Matrix (1999)").unwrap();
/// correlator.dataset_b_mut().set_keys(["matrix", "the"], "the.matrix.1999.mkv").unwrap();
///
/// let result = correlator.correlate(&CorrelateOptions::default()).unwrap();
/// assert_eq!(result.matches.len(), 1);
/// assert_eq!(result.matches[0].value_b, "the.matrix.1999.mkv");
/// ```
#[derive(Debug, Clone)]
pub struct Correlator<V> {
    dataset_a: Dataset<V>,
    dataset_b: Dataset<V>,
    fuzzy_scores: FuzzyScores,
}

impl<V: Eq + Hash + Clone> Default for Correlator<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Eq + Hash + Clone> Correlator<V> {
    /// Create a correlator whose datasets default to weight 1.
    pub fn new() -> Self {
        Self::with_default_weight(1.0)
    }

    pub fn with_default_weight(default_weight: f64) -> Self {
        Self {
            dataset_a: Dataset::new("a", default_weight),
            dataset_b: Dataset::new("b", default_weight),
            fuzzy_scores: FuzzyScores::default(),
        }
    }

    pub fn dataset_a(&self) -> &Dataset<V> {
        &self.dataset_a
    }

    pub fn dataset_b(&self) -> &Dataset<V> {
        &self.dataset_b
    }

    pub fn dataset_a_mut(&mut self) -> &mut Dataset<V> {
        &mut self.dataset_a
    }

    pub fn dataset_b_mut(&mut self) -> &mut Dataset<V> {
        &mut self.dataset_b
    }

    /// Both datasets at once, for loaders that fill them side by side.
    pub fn datasets_mut(&mut self) -> (&mut Dataset<V>, &mut Dataset<V>) {
        (&mut self.dataset_a, &mut self.dataset_b)
    }

    /// Number of cached fuzzy comparisons.
    pub fn cached_comparisons(&self) -> usize {
        self.fuzzy_scores.len()
    }

    /// Correlate the two datasets.
    ///
    /// Options and both datasets are validated before any matching work;
    /// on success the result is complete and independent of the datasets.
    pub fn correlate(&mut self, options: &CorrelateOptions) -> Result<CorrelatorResult<V>> {
        let started = Instant::now();
        options.validate()?;
        self.dataset_a.validate()?;
        self.dataset_b.validate()?;

        let a = &self.dataset_a;
        let b = &self.dataset_b;
        let mut statistics = CorrelateStatistics::default();
        let mut timings = PassTimings::default();

        let mark = Instant::now();
        let type_order = fuzzy_type_order(a, b);
        let streamlined_a = Streamlined::build(a, &type_order);
        let streamlined_b = Streamlined::build(b, &type_order);
        timings.streamline = mark.elapsed();
        debug!(
            values_a = a.len(),
            values_b = b.len(),
            fuzzy_types = type_order.len(),
            elapsed = ?timings.streamline,
            "streamlined datasets"
        );

        let mark = Instant::now();
        let mut pairs = BTreeSet::new();
        exact_candidates(a, b, &mut pairs);
        let fuzzy_table = fuzzy_candidates(a, b, &mut self.fuzzy_scores, &mut pairs)?;
        statistics.fuzzy_comparisons = fuzzy_table.compared();
        statistics.candidate_pairs = pairs.len();
        timings.candidates = mark.elapsed();
        debug!(
            pairs = pairs.len(),
            fuzzy_comparisons = statistics.fuzzy_comparisons,
            elapsed = ?timings.candidates,
            "collected candidate pairs"
        );

        let mark = Instant::now();
        let mut hits = FuzzyHits::default();
        let subtotals: Vec<_> = pairs
            .iter()
            .map(|&(value_a, value_b)| {
                fuzzy_subtotals(
                    &streamlined_a.fuzzy[value_a],
                    &streamlined_b.fuzzy[value_b],
                    &fuzzy_table,
                    &mut hits,
                )
            })
            .collect();
        timings.fuzzy_subtotals = mark.elapsed();
        debug!(elapsed = ?timings.fuzzy_subtotals, "computed fuzzy subtotals");

        let mark = Instant::now();
        let ranking = RankingModel::new(options, a, b);
        let mut streams: Vec<Stream> = match (&ranking, options.ranking) {
            (None, _) | (Some(_), RankingApproach::NotUsed) => vec![Stream::new(RankingApproach::NotUsed)],
            (Some(_), RankingApproach::Best) => vec![
                Stream::new(RankingApproach::Absolute),
                Stream::new(RankingApproach::Relative),
            ],
            (Some(_), approach) => vec![Stream::new(approach)],
        };

        for (&(value_a, value_b), fuzzy) in pairs.iter().zip(&subtotals) {
            let inputs = PairInputs {
                exact_a: &streamlined_a.exact_rounds[value_a],
                exact_b: &streamlined_b.exact_rounds[value_b],
                fuzzy,
                total_keys: streamlined_a.total_keys[value_a] + streamlined_b.total_keys[value_b],
            };
            let score = score_pair(&inputs, &hits, options.score_ratio_bonus);

            let Some(model) = &ranking else {
                for stream in &mut streams {
                    stream.matches.push(Match::new(value_a, value_b, score));
                }
                continue;
            };
            let ranked = model.apply(score, a.ranking(value_a), b.ranking(value_b));
            for stream in &mut streams {
                let score = match stream.approach {
                    RankingApproach::Relative => ranked.relative,
                    _ => ranked.absolute,
                };
                stream.matches.push(Match::new(value_a, value_b, score));
            }
        }
        timings.scoring = mark.elapsed();
        debug!(
            streams = streams.len(),
            elapsed = ?timings.scoring,
            "scored candidate pairs"
        );

        let mark = Instant::now();
        let boiler = MatchBoiler::new(options.reuse());
        let mut outcomes = Vec::with_capacity(streams.len());
        for Stream { approach, mut matches } in streams {
            sort_matches(&mut matches);
            matches.retain(|m| m.score > options.minimum_score);
            let scored = matches.len();

            let boiled = boiler.boil(matches);
            statistics.boiler_hypotheses += boiled.hypotheses;
            let total = boiled.total_score();
            debug!(%approach, scored, kept = boiled.kept.len(), total, "boiled stream");

            if !boiled.kept.is_empty() {
                outcomes.push(Outcome {
                    approach,
                    total,
                    kept: boiled.kept,
                    seen_a: boiled.seen_a,
                    seen_b: boiled.seen_b,
                    scored,
                });
            }
        }
        timings.boiling = mark.elapsed();

        let mark = Instant::now();
        // On equal totals the later stream wins, so relative beats absolute.
        let mut chosen: Option<Outcome> = None;
        for outcome in outcomes {
            if chosen.as_ref().is_none_or(|best| outcome.total >= best.total) {
                chosen = Some(outcome);
            }
        }

        let result = match chosen {
            Some(outcome) => {
                debug!(ranking = %outcome.approach, total = outcome.total, "chose stream");
                statistics.ranking_used = outcome.approach;
                statistics.scored_matches = outcome.scored;
                self.assemble(outcome.kept, &outcome.seen_a, &outcome.seen_b, options.minimum_score)
            }
            None => {
                debug!("no matches above the minimum score");
                statistics.ranking_used = RankingApproach::NotUsed;
                self.assemble(Vec::new(), &HashSet::new(), &HashSet::new(), options.minimum_score)
            }
        };
        timings.finalize = mark.elapsed();
        timings.elapsed = started.elapsed();
        statistics.timings = timings;

        Ok(CorrelatorResult { statistics, ..result })
    }

    fn assemble(
        &self,
        kept: Vec<Match<ValueId, ValueId>>,
        seen_a: &HashSet<ValueId>,
        seen_b: &HashSet<ValueId>,
        minimum_score: f64,
    ) -> CorrelatorResult<V> {
        let matches = kept
            .into_iter()
            .filter_map(|m| {
                Some(CorrelatorMatch {
                    value_a: self.dataset_a.value(m.value_a)?.clone(),
                    value_b: self.dataset_b.value(m.value_b)?.clone(),
                    score: m.score,
                })
            })
            .collect();

        CorrelatorResult {
            matches,
            unmatched_a: unmatched(&self.dataset_a, seen_a),
            unmatched_b: unmatched(&self.dataset_b, seen_b),
            minimum_score,
            statistics: CorrelateStatistics::default(),
        }
    }
}

fn unmatched<V: Eq + Hash + Clone>(dataset: &Dataset<V>, seen: &HashSet<ValueId>) -> Vec<V> {
    dataset
        .values()
        .enumerate()
        .filter(|(id, _)| !seen.contains(id))
        .map(|(_, value)| value.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = CorrelateOptions::default();
        assert_eq!(options.score_ratio_bonus, 1.0);
        assert_eq!(options.ranking, RankingApproach::Best);
        assert!(options.validate().is_ok());
        assert_eq!(options.reuse(), Reuse::NONE);
    }

    #[test]
    fn test_bonus_and_factor_together_rejected() {
        let options = CorrelateOptions {
            ranking_bonus: 1.0,
            ranking_factor: 0.5,
            ..CorrelateOptions::default()
        };
        assert!(matches!(options.validate(), Err(CorrelateError::Config(_))));
    }

    #[test]
    fn test_non_finite_and_negative_options_rejected() {
        let nan = CorrelateOptions {
            score_ratio_bonus: f64::NAN,
            ..CorrelateOptions::default()
        };
        assert!(nan.validate().is_err());
        let negative = CorrelateOptions {
            minimum_score: -1.0,
            ..CorrelateOptions::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: CorrelateOptions =
            serde_json::from_str(r#"{"minimum_score": 0.5, "ranking": "relative", "reuse_b": true}"#).unwrap();
        assert_eq!(options.minimum_score, 0.5);
        assert_eq!(options.ranking, RankingApproach::Relative);
        assert!(options.reuse_b);
        assert_eq!(options.score_ratio_bonus, 1.0);
    }

    #[test]
    fn test_invalid_dataset_fails_before_matching() {
        let mut c: Correlator<&str> = Correlator::new();
        c.dataset_a_mut().set("k", "a1").unwrap();
        c.dataset_a_mut().set_ranking("keyless", 1.0).unwrap();
        c.dataset_b_mut().set("k", "b1").unwrap();
        let err = c.correlate(&CorrelateOptions::default()).unwrap_err();
        assert!(matches!(err, CorrelateError::InvariantViolation { .. }));
    }

    #[test]
    fn test_exact_match_scores_one_plus_bonus() {
        let mut c: Correlator<&str> = Correlator::new();
        c.dataset_a_mut().set("x", "a").unwrap();
        c.dataset_b_mut().set("x", "b").unwrap();

        let plain = c
            .correlate(&CorrelateOptions {
                score_ratio_bonus: 0.0,
                ..CorrelateOptions::default()
            })
            .unwrap();
        assert_eq!(plain.matches[0].score, 1.0);

        let with_bonus = c.correlate(&CorrelateOptions::default()).unwrap();
        assert_eq!(with_bonus.matches[0].score, 2.0);
        assert_eq!(with_bonus.statistics.ranking_used, RankingApproach::NotUsed);
        assert_eq!(with_bonus.statistics.candidate_pairs, 1);
    }

    #[test]
    fn test_ranking_approach_serde_names() {
        let json = serde_json::to_string(&RankingApproach::NotUsed).unwrap();
        assert_eq!(json, "\"not_used\"");
        assert_eq!(RankingApproach::Absolute.to_string(), "absolute");
    }
}
