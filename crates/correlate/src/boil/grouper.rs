//! Splits a match list into connected components.
//!
//! Two matches sharing `value_a` or `value_b` always land in the same
//! component, and every match appears in exactly one component. Components
//! are returned in order of their earliest member, and members keep their
//! input order.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexMap;

use super::candidate::{Candidate, Reuse};

/// Group `matches`, returning each component as positions into `matches`.
///
/// A reusable side can never cause a conflict, so with `reuse.a` matches are
/// grouped purely by `value_b` (and vice versa). With both sides reusable
/// every match is its own component.
pub fn group_positions<T: Candidate>(matches: &[T], reuse: Reuse) -> Vec<Vec<usize>> {
    match (reuse.a, reuse.b) {
        (false, false) => connected(matches),
        (true, false) => by_endpoint(matches, |m| m.value_b()),
        (false, true) => by_endpoint(matches, |m| m.value_a()),
        (true, true) => (0..matches.len()).map(|position| vec![position]).collect(),
    }
}

/// Group `matches` into components of references.
pub fn group<T: Candidate>(matches: &[T], reuse: Reuse) -> Vec<Vec<&T>> {
    group_positions(matches, reuse)
        .into_iter()
        .map(|component| component.into_iter().map(|p| &matches[p]).collect())
        .collect()
}

fn connected<T: Candidate>(matches: &[T]) -> Vec<Vec<usize>> {
    // Slots emptied by a merge stay in place so slot numbers remain valid.
    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut owner_a: HashMap<T::A, usize> = HashMap::new();
    let mut owner_b: HashMap<T::B, usize> = HashMap::new();

    for (position, m) in matches.iter().enumerate() {
        let found_a = owner_a.get(&m.value_a()).copied();
        let found_b = owner_b.get(&m.value_b()).copied();

        let slot = match (found_a, found_b) {
            (None, None) => {
                components.push(Vec::new());
                components.len() - 1
            }
            (Some(slot), None) | (None, Some(slot)) => slot,
            (Some(x), Some(y)) if x == y => x,
            (Some(x), Some(y)) => {
                // Walk the smaller component; it's the one that gets repointed.
                let (bigger, smaller) = if components[x].len() < components[y].len() {
                    (y, x)
                } else {
                    (x, y)
                };
                let moved = std::mem::take(&mut components[smaller]);
                for &member in &moved {
                    owner_a.insert(matches[member].value_a(), bigger);
                    owner_b.insert(matches[member].value_b(), bigger);
                }
                components[bigger].extend(moved);
                bigger
            }
        };

        owner_a.insert(m.value_a(), slot);
        owner_b.insert(m.value_b(), slot);
        components[slot].push(position);
    }

    let mut groups: Vec<Vec<usize>> = components
        .into_iter()
        .filter(|component| !component.is_empty())
        .map(|mut component| {
            component.sort_unstable();
            component
        })
        .collect();
    groups.sort_unstable_by_key(|component| component[0]);
    groups
}

fn by_endpoint<T, K, F>(matches: &[T], endpoint: F) -> Vec<Vec<usize>>
where
    T: Candidate,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut groups: IndexMap<K, Vec<usize>> = IndexMap::new();
    for (position, m) in matches.iter().enumerate() {
        groups.entry(endpoint(m)).or_default().push(position);
    }
    groups.into_values().collect()
}
