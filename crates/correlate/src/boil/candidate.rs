//! Scored candidate pairings consumed by the grouper and the boiler.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Anything with a score and one endpoint on each side.
///
/// Endpoints are ordered so ties between equally good selections can be
/// settled the same way whatever order the candidates arrive in.
pub trait Candidate {
    type A: Copy + Ord + Hash + Debug;
    type B: Copy + Ord + Hash + Debug;

    fn score(&self) -> f64;
    fn value_a(&self) -> Self::A;
    fn value_b(&self) -> Self::B;
}

impl<T: Candidate + ?Sized> Candidate for &T {
    type A = T::A;
    type B = T::B;

    fn score(&self) -> f64 {
        (**self).score()
    }

    fn value_a(&self) -> Self::A {
        (**self).value_a()
    }

    fn value_b(&self) -> Self::B {
        (**self).value_b()
    }
}

/// An immutable (score, value_a, value_b) triple.
///
/// Equality, ordering and hashing all use the full triple, score first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Match<A, B> {
    pub score: f64,
    pub value_a: A,
    pub value_b: B,
}

impl<A, B> Match<A, B> {
    pub fn new(value_a: A, value_b: B, score: f64) -> Self {
        Self {
            score,
            value_a,
            value_b,
        }
    }
}

impl<A, B> Candidate for Match<A, B>
where
    A: Copy + Ord + Hash + Debug,
    B: Copy + Ord + Hash + Debug,
{
    type A = A;
    type B = B;

    fn score(&self) -> f64 {
        self.score
    }

    fn value_a(&self) -> A {
        self.value_a
    }

    fn value_b(&self) -> B {
        self.value_b
    }
}

impl<A: PartialEq, B: PartialEq> PartialEq for Match<A, B> {
    fn eq(&self, other: &Self) -> bool {
        self.score.total_cmp(&other.score) == Ordering::Equal
            && self.value_a == other.value_a
            && self.value_b == other.value_b
    }
}

impl<A: Eq, B: Eq> Eq for Match<A, B> {}

impl<A: Hash, B: Hash> Hash for Match<A, B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.score.to_bits().hash(state);
        self.value_a.hash(state);
        self.value_b.hash(state);
    }
}

impl<A: Ord, B: Ord> PartialOrd for Match<A, B> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A: Ord, B: Ord> Ord for Match<A, B> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.value_a.cmp(&other.value_a))
            .then_with(|| self.value_b.cmp(&other.value_b))
    }
}

/// Which sides may appear in more than one kept match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reuse {
    pub a: bool,
    pub b: bool,
}

impl Reuse {
    /// Neither side may be reused.
    pub const NONE: Reuse = Reuse { a: false, b: false };

    pub fn new(a: bool, b: bool) -> Self {
        Self { a, b }
    }

    /// Both sides reusable: nothing can ever conflict.
    pub fn both(&self) -> bool {
        self.a && self.b
    }
}

/// Sort matches ascending by score, the order the boiler consumes them in.
///
/// The sort is stable, so equal scores keep their relative order.
pub fn sort_matches<T: Candidate>(matches: &mut [T]) {
    matches.sort_by(|x, y| x.score().total_cmp(&y.score()));
}
