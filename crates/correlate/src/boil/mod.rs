//! Conflict resolution over scored matches.
//!
//! [`group_positions`] splits matches into connected components and
//! [`MatchBoiler`] picks the highest-scoring conflict-free subset. Both work
//! on any [`Candidate`], so the correlator reuses them for value matches and
//! for fuzzy key pairings.

mod boiler;
mod candidate;
mod grouper;

pub use boiler::{Boiled, MatchBoiler, boil};
pub use candidate::{Candidate, Match, Reuse, sort_matches};
pub use grouper::{group, group_positions};
