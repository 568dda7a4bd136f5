//! Error types for the correlate library.

use thiserror::Error;

/// Main error type for correlate operations.
///
/// `correlate()` either returns a complete result or fails with one of these
/// before any matching work is done.
#[derive(Debug, Error)]
pub enum CorrelateError {
    /// Invalid combination of correlate options.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A dataset's internal structure is inconsistent.
    #[error("Invariant violation in dataset '{dataset}': {message}")]
    InvariantViolation { dataset: String, message: String },

    /// A ranking that is not a finite number.
    #[error("Invalid ranking {ranking} in dataset '{dataset}': rankings must be finite numbers")]
    InvalidRanking { dataset: String, ranking: f64 },

    /// A key weight that is not a finite number.
    #[error("Invalid weight {weight} in dataset '{dataset}': weights must be finite numbers")]
    InvalidWeight { dataset: String, weight: f64 },

    /// A fuzzy key comparison returned a score outside [0, 1].
    #[error("Fuzzy comparison of {key_a} with {key_b} returned {score}, expected a value in [0, 1]")]
    ContractViolation {
        key_a: String,
        key_b: String,
        score: f64,
    },
}

/// Result type alias for correlate operations.
pub type Result<T> = std::result::Result<T, CorrelateError>;
