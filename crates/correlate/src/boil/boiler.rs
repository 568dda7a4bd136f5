//! Selects a conflict-free subset of scored matches.
//!
//! Matches are consumed highest score first. A match whose endpoint was
//! already used is dropped. When several open matches share the top score
//! and conflict with each other, the boiler tries each member of the
//! smallest conflicting component in turn, boils the remainder under that
//! hypothesis and keeps whichever hypothesis yields the highest total.
//! Hypotheses with equal totals are settled by their endpoints: comparing
//! the two selections, the one holding the lowest `(value_a, value_b)` pair
//! that the other lacks wins. The kept set therefore does not depend on how
//! equal-score matches were ordered in the input.
//!
//! Nested ties are resolved on an explicit stack of frames, so deep tie
//! cascades never grow the call stack.

use std::collections::HashSet;

use tracing::trace;

use super::candidate::{Candidate, Reuse};
use super::grouper::group_positions;

/// Result of boiling a match list.
#[derive(Debug, Clone)]
pub struct Boiled<T: Candidate> {
    /// Kept matches, highest score first.
    pub kept: Vec<T>,
    /// Every `value_a` used by a kept match.
    pub seen_a: HashSet<T::A>,
    /// Every `value_b` used by a kept match.
    pub seen_b: HashSet<T::B>,
    /// Number of tie hypotheses explored.
    pub hypotheses: usize,
}

impl<T: Candidate> Boiled<T> {
    pub fn total_score(&self) -> f64 {
        self.kept.iter().map(|m| m.score()).sum()
    }
}

/// Boils match lists with a fixed reuse policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchBoiler {
    reuse: Reuse,
}

impl MatchBoiler {
    pub fn new(reuse: Reuse) -> Self {
        Self { reuse }
    }

    pub fn reuse(&self) -> Reuse {
        self.reuse
    }

    /// Boil `matches`, which must already be sorted ascending by score.
    ///
    /// Among equal scores, later entries are considered first.
    ///
    /// Each hypothesis re-boils everything below it, including other tied
    /// components of the same score. The worst case is exponential: `k`
    /// disjoint 2x2 blocks at one score, as two duplicate rows on each side
    /// produce, cost `(4^(k + 1) - 4) / 3` hypotheses.
    pub fn boil<T: Candidate>(&self, matches: Vec<T>) -> Boiled<T> {
        debug_assert!(
            matches.windows(2).all(|w| w[0].score() <= w[1].score()),
            "boiler input must be sorted ascending by score"
        );

        if self.reuse.both() {
            let seen_a = matches.iter().map(|m| m.value_a()).collect();
            let seen_b = matches.iter().map(|m| m.value_b()).collect();
            let mut kept = matches;
            kept.reverse();
            return Boiled {
                kept,
                seen_a,
                seen_b,
                hypotheses: 0,
            };
        }

        let mut search = Search {
            items: &matches,
            reuse: self.reuse,
            hypotheses: 0,
        };
        let root = search.run(Frame::root(matches.len()));
        let hypotheses = search.hypotheses;

        let mut slots: Vec<Option<T>> = matches.into_iter().map(Some).collect();
        let kept = root
            .kept
            .iter()
            .filter_map(|&position| slots[position].take())
            .collect();

        Boiled {
            kept,
            seen_a: root.seen_a,
            seen_b: root.seen_b,
            hypotheses,
        }
    }
}

/// Boil `matches` (sorted ascending by score) under `reuse`.
///
/// See [`MatchBoiler::boil`] for the cost of heavily tied input.
pub fn boil<T: Candidate>(matches: Vec<T>, reuse: Reuse) -> Boiled<T> {
    MatchBoiler::new(reuse).boil(matches)
}

/// One level of the search. Positions index the boiler's input slice.
///
/// Since the input is sorted ascending, position order is score order, and
/// every position list below stays sorted ascending.
struct Frame<A, B> {
    /// Candidates still to consider, popped from the tail.
    pending: Vec<usize>,
    seen_a: HashSet<A>,
    seen_b: HashSet<B>,
    /// Kept positions, highest first.
    kept: Vec<usize>,
    branch: Option<Branch<A, B>>,
}

impl<A, B> Frame<A, B> {
    fn root(len: usize) -> Self {
        Self {
            pending: (0..len).collect(),
            seen_a: HashSet::new(),
            seen_b: HashSet::new(),
            kept: Vec::new(),
            branch: None,
        }
    }
}

/// An in-progress tie resolution.
struct Branch<A, B> {
    /// Tied matches with no rival, already claimed in the owning frame.
    settled: Vec<usize>,
    /// Members of the component being branched on, in the order tried.
    members: Vec<usize>,
    next: usize,
    /// Candidates every hypothesis starts from: lower scores plus all
    /// still-open tied matches.
    base: Vec<usize>,
    best: Option<Hypothesis<A, B>>,
}

struct Hypothesis<A, B> {
    member: usize,
    score: f64,
    kept: Vec<usize>,
    seen_a: HashSet<A>,
    seen_b: HashSet<B>,
}

enum Step<A, B> {
    Descend(Frame<A, B>),
    Finished,
}

struct Search<'a, T: Candidate> {
    items: &'a [T],
    reuse: Reuse,
    hypotheses: usize,
}

impl<T: Candidate> Search<'_, T> {
    fn run(&mut self, root: Frame<T::A, T::B>) -> Frame<T::A, T::B> {
        let mut stack = Vec::new();
        let mut frame = root;
        loop {
            match self.advance(&mut frame) {
                Step::Descend(child) => {
                    stack.push(frame);
                    frame = child;
                }
                Step::Finished => match stack.pop() {
                    Some(mut parent) => {
                        self.absorb(&mut parent, frame);
                        frame = parent;
                    }
                    None => return frame,
                },
            }
        }
    }

    fn advance(&mut self, frame: &mut Frame<T::A, T::B>) -> Step<T::A, T::B> {
        if frame.branch.is_some() {
            return self.next_hypothesis(frame);
        }

        while let Some(top) = frame.pending.pop() {
            if self.conflicts(top, &frame.seen_a, &frame.seen_b) {
                continue;
            }
            let score = self.items[top].score();
            let tied = frame
                .pending
                .last()
                .is_some_and(|&next| self.items[next].score() == score);
            if !tied {
                self.keep(frame, top);
                continue;
            }

            let mut run = vec![top];
            while let Some(&next) = frame.pending.last() {
                if self.items[next].score() != score {
                    break;
                }
                frame.pending.pop();
                if !self.conflicts(next, &frame.seen_a, &frame.seen_b) {
                    run.push(next);
                }
            }
            if run.len() == 1 {
                self.keep(frame, top);
                continue;
            }

            if self.resolve_tie(frame, run, score) {
                return self.next_hypothesis(frame);
            }
        }

        Step::Finished
    }

    /// Settle a run of tied matches. Returns true when a branch was opened.
    fn resolve_tie(&self, frame: &mut Frame<T::A, T::B>, run: Vec<usize>, score: f64) -> bool {
        let tied: Vec<&T> = run.iter().map(|&position| &self.items[position]).collect();

        let mut settled = Vec::new();
        let mut open = Vec::new();
        let mut smallest: Option<Vec<usize>> = None;
        for component in group_positions(&tied, self.reuse) {
            if component.len() == 1 {
                let position = run[component[0]];
                self.claim(frame, position);
                settled.push(position);
                continue;
            }
            let members: Vec<usize> = component.iter().map(|&i| run[i]).collect();
            open.extend_from_slice(&members);
            if smallest.as_ref().is_none_or(|s| members.len() < s.len()) {
                smallest = Some(members);
            }
        }

        let Some(mut members) = smallest else {
            settled.sort_unstable_by(|x, y| y.cmp(x));
            frame.kept.extend(settled);
            return false;
        };

        members.sort_unstable_by(|x, y| y.cmp(x));
        open.sort_unstable();
        let mut base = std::mem::take(&mut frame.pending);
        base.extend(open);

        trace!(
            score,
            members = members.len(),
            settled = settled.len(),
            candidates = base.len(),
            "branching on tied component"
        );

        frame.branch = Some(Branch {
            settled,
            members,
            next: 0,
            base,
            best: None,
        });
        true
    }

    fn next_hypothesis(&mut self, frame: &mut Frame<T::A, T::B>) -> Step<T::A, T::B> {
        let Some(branch) = frame.branch.as_mut() else {
            return Step::Finished;
        };

        if let Some(&member) = branch.members.get(branch.next) {
            branch.next += 1;
            self.hypotheses += 1;

            let mut seen_a = frame.seen_a.clone();
            let mut seen_b = frame.seen_b.clone();
            seen_a.insert(self.items[member].value_a());
            seen_b.insert(self.items[member].value_b());

            let pending = branch
                .base
                .iter()
                .copied()
                .filter(|&p| p != member && !self.conflicts(p, &seen_a, &seen_b))
                .collect();

            return Step::Descend(Frame {
                pending,
                seen_a,
                seen_b,
                kept: Vec::new(),
                branch: None,
            });
        }

        // Every hypothesis has been tried; the winner consumed all remaining candidates.
        if let Some(branch) = frame.branch.take() {
            if let Some(best) = branch.best {
                trace!(member = best.member, score = best.score, "kept hypothesis");
                let mut chosen = branch.settled;
                chosen.push(best.member);
                chosen.extend(best.kept);
                chosen.sort_unstable_by(|x, y| y.cmp(x));
                frame.kept.extend(chosen);
                frame.seen_a = best.seen_a;
                frame.seen_b = best.seen_b;
            }
        }
        Step::Finished
    }

    fn absorb(&self, parent: &mut Frame<T::A, T::B>, child: Frame<T::A, T::B>) {
        let Some(branch) = parent.branch.as_mut() else {
            return;
        };
        let member = branch.members[branch.next - 1];
        let score = self.items[member].score()
            + child
                .kept
                .iter()
                .map(|&position| self.items[position].score())
                .sum::<f64>();

        trace!(member, score, "hypothesis scored");
        let better = match branch.best.as_ref() {
            None => true,
            Some(best) if score == best.score => {
                self.precedes((member, child.kept.as_slice()), (best.member, best.kept.as_slice()))
            }
            Some(best) => score > best.score,
        };
        if better {
            branch.best = Some(Hypothesis {
                member,
                score,
                kept: child.kept,
                seen_a: child.seen_a,
                seen_b: child.seen_b,
            });
        }
    }

    /// Whether the first selection wins a tie against the second: the
    /// lowest endpoint pair held by only one of them decides.
    fn precedes(
        &self,
        (member_x, kept_x): (usize, &[usize]),
        (member_y, kept_y): (usize, &[usize]),
    ) -> bool {
        let x = self.endpoints(member_x, kept_x);
        let y = self.endpoints(member_y, kept_y);
        match x.iter().zip(&y).find(|(p, q)| p != q) {
            Some((p, q)) => p < q,
            None => x.len() > y.len(),
        }
    }

    fn endpoints(&self, member: usize, kept: &[usize]) -> Vec<(T::A, T::B)> {
        let mut pairs: Vec<_> = std::iter::once(member)
            .chain(kept.iter().copied())
            .map(|position| (self.items[position].value_a(), self.items[position].value_b()))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    fn conflicts(&self, position: usize, seen_a: &HashSet<T::A>, seen_b: &HashSet<T::B>) -> bool {
        let m = &self.items[position];
        (!self.reuse.a && seen_a.contains(&m.value_a()))
            || (!self.reuse.b && seen_b.contains(&m.value_b()))
    }

    fn claim(&self, frame: &mut Frame<T::A, T::B>, position: usize) {
        let m = &self.items[position];
        frame.seen_a.insert(m.value_a());
        frame.seen_b.insert(m.value_b());
    }

    fn keep(&self, frame: &mut Frame<T::A, T::B>, position: usize) {
        self.claim(frame, position);
        frame.kept.push(position);
    }
}
