//! Fuzzy subtotals: the nested boil over fuzzy key pairings.
//!
//! For each candidate pair and each fuzzy type both values carry, every
//! (key round in A, key round in B) combination with a positive comparison
//! becomes a pairing. Those pairings are boiled so each key round is used
//! at most once, and the kept ones add their raw score to running totals
//! shared across all candidate pairs. Once every pair has been through
//! this pass, [`FuzzyHits`] holds the divisors that finalize each
//! contribution.

use std::collections::HashMap;

use crate::boil::{Candidate, Reuse, boil};
use crate::dataset::KeyId;

use super::candidates::FuzzyTable;
use super::streamline::{FuzzyGroup, FuzzyRound};

/// A fuzzy key at a particular round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct FuzzyEndpoint {
    pub key: KeyId,
    pub round: usize,
}

impl From<&FuzzyRound> for FuzzyEndpoint {
    fn from(round: &FuzzyRound) -> Self {
        Self {
            key: round.key,
            round: round.round,
        }
    }
}

/// A kept fuzzy pairing awaiting finalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FuzzySubtotal {
    /// Raw comparison score.
    pub score: f64,
    /// `weight_a * weight_b * score³`.
    pub weighted: f64,
    pub a: FuzzyEndpoint,
    pub b: FuzzyEndpoint,
}

/// Total raw score each key round has earned across all candidate pairs.
#[derive(Debug, Clone, Default)]
pub(crate) struct FuzzyHits {
    a: HashMap<FuzzyEndpoint, f64>,
    b: HashMap<FuzzyEndpoint, f64>,
}

impl FuzzyHits {
    fn record(&mut self, subtotal: &FuzzySubtotal) {
        *self.a.entry(subtotal.a).or_default() += subtotal.score;
        *self.b.entry(subtotal.b).or_default() += subtotal.score;
    }

    /// Finalized contribution of a subtotal recorded earlier.
    pub fn finalize(&self, subtotal: &FuzzySubtotal) -> f64 {
        let hits_a = self.a.get(&subtotal.a).copied().unwrap_or(subtotal.score);
        let hits_b = self.b.get(&subtotal.b).copied().unwrap_or(subtotal.score);
        subtotal.weighted / (hits_a * hits_b)
    }
}

#[derive(Debug, Clone, Copy)]
struct Pairing {
    subtotal: FuzzySubtotal,
    /// Lower and higher of the two rounds; earlier rounds sort later and
    /// so are considered first among equal scores.
    rounds: (usize, usize),
}

impl Candidate for Pairing {
    type A = FuzzyEndpoint;
    type B = FuzzyEndpoint;

    fn score(&self) -> f64 {
        self.subtotal.score
    }

    fn value_a(&self) -> FuzzyEndpoint {
        self.subtotal.a
    }

    fn value_b(&self) -> FuzzyEndpoint {
        self.subtotal.b
    }
}

/// Boil the fuzzy pairings of one candidate pair and record the kept ones.
///
/// `groups_a` and `groups_b` are the two values' fuzzy groups; types are
/// visited in A's slot order.
pub(crate) fn fuzzy_subtotals(
    groups_a: &[FuzzyGroup],
    groups_b: &[FuzzyGroup],
    scores: &FuzzyTable,
    hits: &mut FuzzyHits,
) -> Vec<FuzzySubtotal> {
    let mut subtotals = Vec::new();

    for group_a in groups_a {
        let Some(group_b) = groups_b.iter().find(|g| g.slot == group_a.slot) else {
            continue;
        };

        let mut pairings = Vec::new();
        for rounds_a in &group_a.keys {
            for rounds_b in &group_b.keys {
                let (Some(first_a), Some(first_b)) = (rounds_a.first(), rounds_b.first()) else {
                    continue;
                };
                let score = scores.get(first_a.key, first_b.key);
                if score <= 0.0 {
                    continue;
                }
                let cubed = score.powi(3);
                for round_a in rounds_a {
                    for round_b in rounds_b {
                        let low = round_a.round.min(round_b.round);
                        let high = round_a.round.max(round_b.round);
                        pairings.push(Pairing {
                            subtotal: FuzzySubtotal {
                                score,
                                weighted: round_a.weight * round_b.weight * cubed,
                                a: round_a.into(),
                                b: round_b.into(),
                            },
                            rounds: (low, high),
                        });
                    }
                }
            }
        }

        if pairings.len() > 1 {
            pairings.sort_by(|x, y| {
                x.subtotal
                    .score
                    .total_cmp(&y.subtotal.score)
                    .then_with(|| y.rounds.cmp(&x.rounds))
            });
            pairings = boil(pairings, Reuse::NONE).kept;
        }

        for pairing in pairings {
            hits.record(&pairing.subtotal);
            subtotals.push(pairing.subtotal);
        }
    }

    subtotals
}
