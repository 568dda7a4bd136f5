//! Ranking adjustments applied to pair scores.

use std::hash::Hash;

use crate::correlator::{CorrelateOptions, RankingApproach};
use crate::dataset::Dataset;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Adjustment {
    /// Scale scores toward `1 - factor` as rankings diverge.
    Factor(f64),
    /// Add up to `bonus` as rankings agree.
    Bonus(f64),
}

/// A pair score adjusted under both distance metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RankedScores {
    pub absolute: f64,
    pub relative: f64,
}

/// Ranking parameters for one correlation, present only when rankings are
/// in play.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RankingModel {
    adjustment: Adjustment,
    low_a: f64,
    span_a: f64,
    low_b: f64,
    span_b: f64,
    widest: f64,
}

impl RankingModel {
    /// Rankings are in play when an adjustment is configured, the approach
    /// is not `NotUsed`, and both datasets rank more than one value.
    pub fn new<V: Eq + Hash + Clone>(options: &CorrelateOptions, a: &Dataset<V>, b: &Dataset<V>) -> Option<Self> {
        if options.ranking == RankingApproach::NotUsed {
            return None;
        }
        let adjustment = if options.ranking_factor != 0.0 {
            Adjustment::Factor(options.ranking_factor)
        } else if options.ranking_bonus != 0.0 {
            Adjustment::Bonus(options.ranking_bonus)
        } else {
            return None;
        };
        if a.ranked_count() < 2 || b.ranked_count() < 2 {
            return None;
        }
        let (low_a, high_a) = a.ranking_bounds()?;
        let (low_b, high_b) = b.ranking_bounds()?;
        let span_a = high_a - low_a;
        let span_b = high_b - low_b;

        Some(Self {
            adjustment,
            low_a,
            span_a,
            low_b,
            span_b,
            widest: span_a.max(span_b),
        })
    }

    /// Adjust `score` for a pair whose values carry these rankings.
    pub fn apply(&self, score: f64, ranking_a: Option<f64>, ranking_b: Option<f64>) -> RankedScores {
        let (Some(ranking_a), Some(ranking_b)) = (ranking_a, ranking_b) else {
            let score = match self.adjustment {
                Adjustment::Factor(factor) => score * (1.0 - factor),
                Adjustment::Bonus(_) => score,
            };
            return RankedScores {
                absolute: score,
                relative: score,
            };
        };

        let distance = (ranking_a - ranking_b).abs();
        let absolute_factor = if self.widest > 0.0 {
            1.0 - distance / self.widest
        } else if distance == 0.0 {
            1.0
        } else {
            0.0
        };
        let relative_a = relative(ranking_a, self.low_a, self.span_a);
        let relative_b = relative(ranking_b, self.low_b, self.span_b);
        let relative_factor = 1.0 - (relative_a - relative_b).abs();

        let adjust = |distance_factor: f64| match self.adjustment {
            Adjustment::Factor(factor) => score * ((1.0 - factor) + factor * distance_factor),
            Adjustment::Bonus(bonus) => score + bonus * distance_factor,
        };
        RankedScores {
            absolute: adjust(absolute_factor),
            relative: adjust(relative_factor),
        }
    }
}

fn relative(ranking: f64, low: f64, span: f64) -> f64 {
    if span > 0.0 { (ranking - low) / span } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(name: &str, rankings: &[f64]) -> Dataset<usize> {
        let mut ds = Dataset::new(name, 1.0);
        for (value, &ranking) in rankings.iter().enumerate() {
            ds.set("k", value).unwrap();
            ds.set_ranking(value, ranking).unwrap();
        }
        ds
    }

    fn options(factor: f64, bonus: f64) -> CorrelateOptions {
        CorrelateOptions {
            ranking_factor: factor,
            ranking_bonus: bonus,
            ..CorrelateOptions::default()
        }
    }

    #[test]
    fn test_not_in_play_without_adjustment_or_rankings() {
        let a = ranked("a", &[1.0, 2.0]);
        let b = ranked("b", &[1.0, 2.0]);
        let one = ranked("b", &[1.0]);
        assert!(RankingModel::new(&options(0.0, 0.0), &a, &b).is_none());
        assert!(RankingModel::new(&options(0.5, 0.0), &a, &one).is_none());
        let not_used = CorrelateOptions {
            ranking: RankingApproach::NotUsed,
            ..options(0.5, 0.0)
        };
        assert!(RankingModel::new(&not_used, &a, &b).is_none());
        assert!(RankingModel::new(&options(0.5, 0.0), &a, &b).is_some());
    }

    #[test]
    fn test_factor_scales_by_distance() {
        let a = ranked("a", &[0.0, 10.0]);
        let b = ranked("b", &[0.0, 100.0]);
        let model = RankingModel::new(&options(0.5, 0.0), &a, &b).unwrap();

        let same = model.apply(4.0, Some(10.0), Some(10.0));
        assert_eq!(same.absolute, 4.0);

        // Absolute distance 90 over the widest span 100.
        let far = model.apply(4.0, Some(10.0), Some(100.0));
        assert!((far.absolute - 4.0 * (0.5 + 0.5 * 0.1)).abs() < 1e-12);
        // Both at the top of their own range.
        assert_eq!(far.relative, 4.0);
    }

    #[test]
    fn test_missing_ranking_penalized_only_under_factor() {
        let a = ranked("a", &[0.0, 10.0]);
        let b = ranked("b", &[0.0, 10.0]);

        let factor = RankingModel::new(&options(0.25, 0.0), &a, &b).unwrap();
        let missing = factor.apply(8.0, None, Some(3.0));
        assert_eq!(missing.absolute, 6.0);
        assert_eq!(missing.relative, 6.0);

        let bonus = RankingModel::new(&options(0.0, 2.0), &a, &b).unwrap();
        assert_eq!(bonus.apply(8.0, Some(1.0), None).absolute, 8.0);
        assert_eq!(bonus.apply(8.0, Some(5.0), Some(5.0)).absolute, 10.0);
    }
}
