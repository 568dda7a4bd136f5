//! Candidate pair discovery and the fuzzy comparison cache.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use crate::dataset::{Dataset, KeyId, ValueId};
use crate::error::{CorrelateError, Result};
use crate::key::{FuzzyKey, Key};

/// A (value in A, value in B) pair worth scoring.
pub(crate) type CandidatePair = (ValueId, ValueId);

/// Memoized fuzzy comparisons, keyed by the keys themselves.
///
/// Entries depend only on the two keys, so they stay valid however the
/// datasets change between runs, including when a dataset is replaced.
#[derive(Debug, Clone, Default)]
pub(crate) struct FuzzyScores {
    scores: HashMap<(FuzzyKey, FuzzyKey), f64>,
}

impl FuzzyScores {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Compare two keys, consulting the cache first.
    ///
    /// Returns the score and whether `compare` actually ran.
    fn score(&mut self, key_a: &FuzzyKey, key_b: &FuzzyKey) -> Result<(f64, bool)> {
        if let Some(&score) = self.scores.get(&(key_a.clone(), key_b.clone())) {
            return Ok((score, false));
        }
        let score = key_a.compare(key_b).unwrap_or(0.0);
        if !(0.0..=1.0).contains(&score) {
            return Err(CorrelateError::ContractViolation {
                key_a: format!("{key_a:?}"),
                key_b: format!("{key_b:?}"),
                score,
            });
        }
        self.scores.insert((key_a.clone(), key_b.clone()), score);
        Ok((score, true))
    }
}

/// Positive fuzzy scores of one run, by (key in A, key in B).
#[derive(Debug, Clone, Default)]
pub(crate) struct FuzzyTable {
    scores: HashMap<(KeyId, KeyId), f64>,
    compared: usize,
}

impl FuzzyTable {
    /// Score of a key pair, 0 when the keys never scored.
    pub fn get(&self, key_a: KeyId, key_b: KeyId) -> f64 {
        self.scores.get(&(key_a, key_b)).copied().unwrap_or(0.0)
    }

    /// Comparisons that were not already cached.
    pub fn compared(&self) -> usize {
        self.compared
    }
}

/// Add every pair sharing an exact key at round 0.
pub(crate) fn exact_candidates<V: Eq + Hash + Clone>(
    a: &Dataset<V>,
    b: &Dataset<V>,
    pairs: &mut BTreeSet<CandidatePair>,
) {
    for (key_a, key) in a.keys().iter().enumerate() {
        if key.is_fuzzy() {
            continue;
        }
        let Some(key_b) = b.keys().get_index_of(key) else {
            continue;
        };
        let (Some(holders_a), Some(holders_b)) = (a.key_rounds(key_a).first(), b.key_rounds(key_b).first()) else {
            continue;
        };
        for &value_a in holders_a {
            for &value_b in holders_b {
                pairs.insert((value_a, value_b));
            }
        }
    }
}

/// Compare every same-typed fuzzy key pair and add the pairs of values
/// holding keys with a positive score.
///
/// Returns this run's scores by key id.
pub(crate) fn fuzzy_candidates<V: Eq + Hash + Clone>(
    a: &Dataset<V>,
    b: &Dataset<V>,
    cache: &mut FuzzyScores,
    pairs: &mut BTreeSet<CandidatePair>,
) -> Result<FuzzyTable> {
    let mut keys_b: HashMap<_, Vec<(KeyId, &FuzzyKey)>> = HashMap::new();
    for (id, key) in b.keys().iter().enumerate() {
        if let Key::Fuzzy(fuzzy) = key {
            keys_b.entry(fuzzy.type_tag()).or_default().push((id, fuzzy));
        }
    }

    let mut table = FuzzyTable::default();
    for (id_a, key) in a.keys().iter().enumerate() {
        let Key::Fuzzy(key_a) = key else {
            continue;
        };
        let Some(rivals) = keys_b.get(&key_a.type_tag()) else {
            continue;
        };
        for &(id_b, key_b) in rivals {
            let (score, fresh) = cache.score(key_a, key_b)?;
            table.compared += usize::from(fresh);
            if score <= 0.0 {
                continue;
            }
            table.scores.insert((id_a, id_b), score);
            let (Some(holders_a), Some(holders_b)) = (a.key_rounds(id_a).first(), b.key_rounds(id_b).first()) else {
                continue;
            };
            for &value_a in holders_a {
                for &value_b in holders_b {
                    pairs.insert((value_a, value_b));
                }
            }
        }
    }
    Ok(table)
}
