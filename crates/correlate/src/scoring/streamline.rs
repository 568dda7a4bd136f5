//! Per-value key tables flattened for the scoring passes.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::hash::Hash;

use indexmap::IndexSet;

use crate::dataset::{Dataset, KeyId};
use crate::key::{ExactKey, Key};

/// One round of a fuzzy key on a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FuzzyRound {
    pub key: KeyId,
    pub round: usize,
    pub weight: f64,
}

/// A value's fuzzy keys of one type.
#[derive(Debug, Clone)]
pub(crate) struct FuzzyGroup {
    /// Position of the key type in the correlation's type order.
    pub slot: usize,
    /// One entry per key, each listing its rounds highest weight first.
    pub keys: Vec<Vec<FuzzyRound>>,
}

/// Precomputed tables for every value of one dataset.
#[derive(Debug)]
pub(crate) struct Streamlined<'a> {
    /// Per value, per round: exact key -> weight divided by the number of
    /// values holding that key at that round.
    pub exact_rounds: Vec<Vec<BTreeMap<&'a ExactKey, f64>>>,
    /// Per value: fuzzy keys grouped by type, ordered by slot.
    pub fuzzy: Vec<Vec<FuzzyGroup>>,
    /// Per value: number of (key, round) associations, exact and fuzzy.
    pub total_keys: Vec<usize>,
}

impl<'a> Streamlined<'a> {
    pub fn build<V: Eq + Hash + Clone>(dataset: &'a Dataset<V>, type_order: &IndexSet<TypeId>) -> Self {
        let keys = dataset.keys();
        let mut exact_rounds = Vec::with_capacity(dataset.len());
        let mut fuzzy = Vec::with_capacity(dataset.len());
        let mut total_keys = Vec::with_capacity(dataset.len());

        for value_id in 0..dataset.len() {
            let mut rounds: Vec<BTreeMap<&'a ExactKey, f64>> = Vec::new();
            let mut groups: BTreeMap<usize, Vec<Vec<FuzzyRound>>> = BTreeMap::new();
            let mut total = 0;

            for (&key_id, weights) in dataset.value_keys(value_id) {
                total += weights.len();
                match &keys[key_id] {
                    Key::Exact(exact) => {
                        let holders = dataset.key_rounds(key_id);
                        for (round, &weight) in weights.iter().enumerate() {
                            if rounds.len() == round {
                                rounds.push(BTreeMap::new());
                            }
                            let count = holders[round].len().max(1);
                            rounds[round].insert(exact, weight / count as f64);
                        }
                    }
                    Key::Fuzzy(key) => {
                        let Some(slot) = type_order.get_index_of(&key.type_tag()) else {
                            continue;
                        };
                        let key_rounds = weights
                            .iter()
                            .enumerate()
                            .map(|(round, &weight)| FuzzyRound {
                                key: key_id,
                                round,
                                weight,
                            })
                            .collect();
                        groups.entry(slot).or_default().push(key_rounds);
                    }
                }
            }

            exact_rounds.push(rounds);
            fuzzy.push(
                groups
                    .into_iter()
                    .map(|(slot, keys)| FuzzyGroup { slot, keys })
                    .collect(),
            );
            total_keys.push(total);
        }

        Self {
            exact_rounds,
            fuzzy,
            total_keys,
        }
    }
}

/// Fuzzy key types of both datasets, A's in insertion order followed by any
/// only B has.
pub(crate) fn fuzzy_type_order<V: Eq + Hash + Clone>(a: &Dataset<V>, b: &Dataset<V>) -> IndexSet<TypeId> {
    let mut order = a.fuzzy_types().clone();
    order.extend(b.fuzzy_types().iter().copied());
    order
}
