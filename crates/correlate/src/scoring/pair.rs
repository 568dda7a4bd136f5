//! Final score of one candidate pair, before ranking adjustments.

use std::collections::BTreeMap;

use crate::key::ExactKey;

use super::fuzzy::{FuzzyHits, FuzzySubtotal};

/// Inputs for scoring one (value in A, value in B) pair.
pub(crate) struct PairInputs<'p, 'k> {
    pub exact_a: &'p [BTreeMap<&'k ExactKey, f64>],
    pub exact_b: &'p [BTreeMap<&'k ExactKey, f64>],
    pub fuzzy: &'p [FuzzySubtotal],
    /// Key associations on both values together.
    pub total_keys: usize,
}

/// Score a pair: exact rounds, finalized fuzzy subtotals and the
/// score-ratio bonus.
///
/// Exact rounds are walked in lock-step and the walk stops at the first
/// round with no shared key or no non-zero contribution, since later
/// rounds only hold subsets of earlier ones.
pub(crate) fn score_pair(inputs: &PairInputs<'_, '_>, hits: &FuzzyHits, score_ratio_bonus: f64) -> f64 {
    let mut contributions = Vec::new();
    // Matched key count (twice per shared key), the numerator of the ratio bonus.
    let mut base = 0.0;

    for (round_a, round_b) in inputs.exact_a.iter().zip(inputs.exact_b) {
        let before = contributions.len();
        let mut shared = 0usize;
        for (key, weight_a) in round_a {
            if let Some(weight_b) = round_b.get(key) {
                shared += 1;
                let contribution = weight_a * weight_b;
                if contribution != 0.0 {
                    contributions.push(contribution);
                }
            }
        }
        if shared == 0 {
            break;
        }
        base += 2.0 * shared as f64;
        if contributions.len() == before {
            break;
        }
    }

    for subtotal in inputs.fuzzy {
        contributions.push(hits.finalize(subtotal));
        base += 2.0 * subtotal.score;
    }

    contributions.sort_by(f64::total_cmp);
    let mut score: f64 = contributions.iter().sum();

    if score_ratio_bonus != 0.0 && inputs.total_keys > 0 {
        score += score_ratio_bonus * base / inputs.total_keys as f64;
    }
    score
}
