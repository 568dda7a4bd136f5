//! Correlate: pair up values from two datasets by the keys they share.
//!
//! Each dataset maps values to keys. Keys are either exact tokens or fuzzy
//! keys scored by a caller-supplied similarity function. The correlator
//! scores every pair of values that share a key and then boils the scored
//! pairs down to a conflict-free set with the highest total score.
//!
//! # Scoring in brief
//!
//! - A shared exact key contributes `weight_a * weight_b`, each weight divided
//!   by how many values on its side hold the key. Common keys count less.
//! - Attaching the same key to a value again adds a *round*; later rounds
//!   only score while earlier ones kept matching.
//! - Fuzzy keys contribute `weight_a * weight_b * score³`, normalized by how
//!   much each key has already earned across all pairs.
//! - An optional bonus rewards pairs whose matched keys are a large share
//!   of their keys, and optional rankings favor order-consistent pairs.
//!
//! # Example
//!
//! ```
//! use correlate::{CorrelateOptions, Correlator, str_to_keys};
//!
//! let mut correlator = Correlator::new();
//! let (a, b) = correlator.datasets_mut();
//! for title in ["The Tears of Night", "The Hatchet House Theft"] {
//!     a.set_keys(str_to_keys(title), title.to_string()).unwrap();
//! }
//! for file in ["hatchet_house_theft.mp3", "tears.of.night.mp3", "unrelated.mp3"] {
//!     b.set_keys(str_to_keys(file), file.to_string()).unwrap();
//! }
//!
//! let result = correlator.correlate(&CorrelateOptions::default()).unwrap();
//! assert_eq!(result.matches.len(), 2);
//! assert_eq!(result.unmatched_b, vec!["unrelated.mp3".to_string()]);
//! ```

pub mod boil;
pub mod dataset;
pub mod error;
pub mod fuzzy;
pub mod key;
pub mod result;
pub mod text;

mod correlator;
mod scoring;

pub use crate::correlator::{CorrelateOptions, Correlator, RankingApproach};
pub use boil::{Match, MatchBoiler, Reuse};
pub use dataset::{Dataset, DatasetSummary, KeyId, ValueId};
pub use error::{CorrelateError, Result};
pub use key::{ExactKey, FuzzyComparable, FuzzyKey, Key};
pub use result::{CorrelateStatistics, CorrelatorMatch, CorrelatorResult, PassTimings};
pub use text::str_to_keys;
