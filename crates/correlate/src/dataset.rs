//! Datasets: values, the keys attached to them, and optional rankings.
//!
//! A dataset is built by append-only insertion. Each value is interned to a
//! [`ValueId`] on first use and each key to a [`KeyId`]; attaching the same
//! key to the same value again adds another *round* with its own weight.

use std::any::TypeId;
use std::collections::BTreeSet;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{CorrelateError, Result};
use crate::key::Key;

/// Stable handle of a value within one dataset.
pub type ValueId = usize;

/// Stable handle of a key within one dataset.
pub type KeyId = usize;

/// One side of a correlation.
#[derive(Debug, Clone)]
pub struct Dataset<V> {
    name: String,
    default_weight: f64,
    values: IndexSet<V>,
    /// Per value: key -> weights, highest first. One weight per round.
    value_keys: Vec<IndexMap<KeyId, Vec<f64>>>,
    keys: IndexSet<Key>,
    /// Per key: round -> values associated with the key at least `round + 1` times.
    key_rounds: Vec<Vec<BTreeSet<ValueId>>>,
    /// Fuzzy key types in order of first insertion.
    fuzzy_types: IndexSet<TypeId>,
    rankings: Vec<Option<f64>>,
    lowest_ranking: f64,
    highest_ranking: f64,
    max_round: usize,
}

/// Counts describing a dataset, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
    pub values: usize,
    pub exact_keys: usize,
    pub fuzzy_keys: usize,
    pub fuzzy_types: usize,
    /// Total number of (key, value, round) associations.
    pub associations: usize,
    pub max_round: usize,
    pub ranked_values: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_ranking: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_ranking: Option<f64>,
}

impl<V: Eq + Hash + Clone> Dataset<V> {
    /// Create an empty dataset whose `set` calls use `default_weight`.
    pub fn new(name: impl Into<String>, default_weight: f64) -> Self {
        Self {
            name: name.into(),
            default_weight,
            values: IndexSet::new(),
            value_keys: Vec::new(),
            keys: IndexSet::new(),
            key_rounds: Vec::new(),
            fuzzy_types: IndexSet::new(),
            rankings: Vec::new(),
            lowest_ranking: f64::INFINITY,
            highest_ranking: f64::NEG_INFINITY,
            max_round: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in insertion order; the position is the value's [`ValueId`].
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.values.iter()
    }

    pub fn value(&self, id: ValueId) -> Option<&V> {
        self.values.get_index(id)
    }

    pub fn value_id(&self, value: &V) -> Option<ValueId> {
        self.values.get_index_of(value)
    }

    /// Attach `key` to `value` with the default weight.
    pub fn set(&mut self, key: impl Into<Key>, value: V) -> Result<ValueId> {
        self.set_weighted(key, value, self.default_weight)
    }

    /// Attach `key` to `value` with an explicit weight.
    ///
    /// Attaching a key that is already attached to the value adds a new
    /// round; the value's weights for that key are kept highest first.
    pub fn set_weighted(&mut self, key: impl Into<Key>, value: V, weight: f64) -> Result<ValueId> {
        self.check_weight(weight)?;
        let value_id = self.intern_value(value);
        self.attach(key.into(), value_id, weight);
        Ok(value_id)
    }

    /// Attach every key in `keys` to `value` with the default weight.
    pub fn set_keys<I, K>(&mut self, keys: I, value: V) -> Result<ValueId>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.set_keys_weighted(keys, value, self.default_weight)
    }

    /// Attach every key in `keys` to `value` with the same weight.
    pub fn set_keys_weighted<I, K>(&mut self, keys: I, value: V, weight: f64) -> Result<ValueId>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.check_weight(weight)?;
        let value_id = self.intern_value(value);
        for key in keys {
            self.attach(key.into(), value_id, weight);
        }
        Ok(value_id)
    }

    /// Record an ordering hint for `value`.
    ///
    /// Rankings bias matching toward pairs whose positions in their datasets
    /// agree. The value is created if it does not exist yet, but it still
    /// needs at least one key before correlating.
    pub fn set_ranking(&mut self, value: V, ranking: f64) -> Result<ValueId> {
        if !ranking.is_finite() {
            return Err(CorrelateError::InvalidRanking {
                dataset: self.name.clone(),
                ranking,
            });
        }
        let value_id = self.intern_value(value);
        self.rankings[value_id] = Some(ranking);
        self.lowest_ranking = self.lowest_ranking.min(ranking);
        self.highest_ranking = self.highest_ranking.max(ranking);
        Ok(value_id)
    }

    pub fn ranking(&self, id: ValueId) -> Option<f64> {
        self.rankings.get(id).copied().flatten()
    }

    /// Number of values carrying a ranking.
    pub fn ranked_count(&self) -> usize {
        self.rankings.iter().filter(|r| r.is_some()).count()
    }

    /// Lowest and highest ranking seen, if any.
    pub fn ranking_bounds(&self) -> Option<(f64, f64)> {
        if self.lowest_ranking > self.highest_ranking {
            return None;
        }
        Some((self.lowest_ranking, self.highest_ranking))
    }

    /// Width of the ranking range, 0 when nothing is ranked.
    pub fn ranking_span(&self) -> f64 {
        self.ranking_bounds()
            .map(|(low, high)| high - low)
            .unwrap_or(0.0)
    }

    /// Weights attached for `key` on `value`, highest first.
    pub fn weights(&self, value: &V, key: &Key) -> Option<&[f64]> {
        let value_id = self.value_id(value)?;
        let key_id = self.keys.get_index_of(key)?;
        self.value_keys[value_id]
            .get(&key_id)
            .map(|weights| weights.as_slice())
    }

    /// Highest round count of any (key, value) association.
    pub fn max_round(&self) -> usize {
        self.max_round
    }

    pub fn summary(&self) -> DatasetSummary {
        let fuzzy_keys = self.keys.iter().filter(|k| k.is_fuzzy()).count();
        let associations = self
            .value_keys
            .iter()
            .flat_map(|keys| keys.values())
            .map(|weights| weights.len())
            .sum();
        let bounds = self.ranking_bounds();

        DatasetSummary {
            name: self.name.clone(),
            values: self.values.len(),
            exact_keys: self.keys.len() - fuzzy_keys,
            fuzzy_keys,
            fuzzy_types: self.fuzzy_types.len(),
            associations,
            max_round: self.max_round,
            ranked_values: self.ranked_count(),
            lowest_ranking: bounds.map(|(low, _)| low),
            highest_ranking: bounds.map(|(_, high)| high),
        }
    }

    /// Check the structural invariants the scoring pass relies on.
    pub fn validate(&self) -> Result<()> {
        let values = self.values.len();
        if self.value_keys.len() != values || self.rankings.len() != values {
            return Err(self.violation(format!(
                "{} values but {} key tables and {} ranking slots",
                values,
                self.value_keys.len(),
                self.rankings.len()
            )));
        }

        let keyless: Vec<String> = self
            .value_keys
            .iter()
            .enumerate()
            .filter(|(_, keys)| keys.is_empty())
            .map(|(id, _)| format!("#{id}"))
            .collect();
        if !keyless.is_empty() {
            return Err(self.violation(format!(
                "{} values with no keys: {}",
                keyless.len(),
                keyless.join(" ")
            )));
        }

        for (value_id, keys) in self.value_keys.iter().enumerate() {
            for (&key_id, weights) in keys {
                if weights.windows(2).any(|w| w[0] < w[1]) {
                    return Err(self.violation(format!(
                        "weights of key #{key_id} on value #{value_id} are not sorted highest first"
                    )));
                }
                let rounds = &self.key_rounds[key_id];
                if rounds.len() < weights.len()
                    || (0..weights.len()).any(|round| !rounds[round].contains(&value_id))
                {
                    return Err(self.violation(format!(
                        "key #{key_id} is missing value #{value_id} from its round index"
                    )));
                }
            }
        }

        for (key_id, rounds) in self.key_rounds.iter().enumerate() {
            for (round, members) in rounds.iter().enumerate() {
                if let Some(bad) = members.iter().find(|&&id| id >= values) {
                    return Err(self.violation(format!(
                        "key #{key_id} round {round} refers to unknown value #{bad}"
                    )));
                }
                // Non-strict: a round may hold exactly the same values as the previous one.
                if round > 0 && !members.is_subset(&rounds[round - 1]) {
                    return Err(self.violation(format!(
                        "key #{key_id} round {round} is not a subset of round {}",
                        round - 1
                    )));
                }
            }
        }

        Ok(())
    }

    pub(crate) fn keys(&self) -> &IndexSet<Key> {
        &self.keys
    }

    pub(crate) fn value_keys(&self, value_id: ValueId) -> &IndexMap<KeyId, Vec<f64>> {
        &self.value_keys[value_id]
    }

    /// Values associated with `key_id` at `round`, or an empty slice of rounds.
    pub(crate) fn key_rounds(&self, key_id: KeyId) -> &[BTreeSet<ValueId>] {
        &self.key_rounds[key_id]
    }

    pub(crate) fn fuzzy_types(&self) -> &IndexSet<TypeId> {
        &self.fuzzy_types
    }

    fn check_weight(&self, weight: f64) -> Result<()> {
        if weight.is_finite() {
            Ok(())
        } else {
            Err(CorrelateError::InvalidWeight {
                dataset: self.name.clone(),
                weight,
            })
        }
    }

    fn intern_value(&mut self, value: V) -> ValueId {
        let (value_id, inserted) = self.values.insert_full(value);
        if inserted {
            self.value_keys.push(IndexMap::new());
            self.rankings.push(None);
        }
        value_id
    }

    fn attach(&mut self, key: Key, value_id: ValueId, weight: f64) {
        if let Key::Fuzzy(fuzzy) = &key {
            self.fuzzy_types.insert(fuzzy.type_tag());
        }
        let (key_id, inserted) = self.keys.insert_full(key);
        if inserted {
            self.key_rounds.push(Vec::new());
        }

        let weights = self.value_keys[value_id].entry(key_id).or_default();
        let round = weights.len();
        weights.push(weight);
        weights.sort_by(|a, b| b.total_cmp(a));

        let rounds = &mut self.key_rounds[key_id];
        if rounds.len() == round {
            rounds.push(BTreeSet::new());
        }
        rounds[round].insert(value_id);

        self.max_round = self.max_round.max(round + 1);
    }

    fn violation(&self, message: String) -> CorrelateError {
        CorrelateError::InvariantViolation {
            dataset: self.name.clone(),
            message,
        }
    }
}
