//! Ready-made fuzzy keys for common catalog fields.
//!
//! Each type implements [`FuzzyComparable`](crate::FuzzyComparable); wrap it
//! in a [`FuzzyKey`](crate::FuzzyKey) to attach it to a value.

mod date;
mod episode;
mod text;

pub use date::DateKey;
pub use episode::EpisodeKey;
pub use text::TextKey;
