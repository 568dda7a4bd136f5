//! Free text compared by edit distance.

use std::hash::{Hash, Hasher};

use crate::key::FuzzyComparable;

/// Text compared case-insensitively by normalized Levenshtein similarity.
///
/// Similarities at or below `minimum_score` count as no match; the rest are
/// rescaled so `minimum_score` maps to 0 and identical text to 1. Two keys
/// with different thresholds use the stricter one, keeping `compare`
/// symmetric.
#[derive(Debug, Clone)]
pub struct TextKey {
    text: String,
    lower: String,
    minimum_score: f64,
}

impl TextKey {
    /// `minimum_score` is clamped to `[0, 1]`.
    pub fn new(text: impl Into<String>, minimum_score: f64) -> Self {
        let text = text.into();
        let lower = text.to_lowercase();
        let minimum_score = if minimum_score.is_nan() {
            0.0
        } else {
            minimum_score.clamp(0.0, 1.0)
        };
        Self {
            text,
            lower,
            minimum_score,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn minimum_score(&self) -> f64 {
        self.minimum_score
    }
}

impl PartialEq for TextKey {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.minimum_score.to_bits() == other.minimum_score.to_bits()
    }
}

impl Eq for TextKey {}

impl Hash for TextKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
        self.minimum_score.to_bits().hash(state);
    }
}

impl FuzzyComparable for TextKey {
    fn compare(&self, other: &Self) -> Option<f64> {
        let minimum = self.minimum_score.max(other.minimum_score);
        let score = strsim::normalized_levenshtein(&self.lower, &other.lower) - minimum;
        if score < 0.0 {
            return Some(0.0);
        }
        if minimum < 1.0 {
            return Some((score / (1.0 - minimum)).min(1.0));
        }
        Some(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_ignores_case() {
        let a = TextKey::new("The Tears of Night", 0.5);
        let b = TextKey::new("the tears of night", 0.5);
        assert_eq!(a.compare(&b), Some(1.0));
        assert_ne!(a, b);
    }

    #[test]
    fn test_below_threshold_scores_zero() {
        let a = TextKey::new("abcdefghij", 0.5);
        let b = TextKey::new("zyxwvutsrq", 0.5);
        assert_eq!(a.compare(&b), Some(0.0));
    }

    #[test]
    fn test_rescaled_above_threshold() {
        // One substitution in ten characters: similarity 0.9.
        let a = TextKey::new("abcdefghij", 0.5);
        let b = TextKey::new("abcdefghiX", 0.5);
        let score = a.compare(&b).unwrap();
        assert!((score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_stricter_threshold_wins_both_ways() {
        let loose = TextKey::new("abcdefghij", 0.0);
        let strict = TextKey::new("abcdefghiX", 0.95);
        assert_eq!(loose.compare(&strict), strict.compare(&loose));
        assert_eq!(loose.compare(&strict), Some(0.0));
    }

    #[test]
    fn test_minimum_clamped() {
        assert_eq!(TextKey::new("x", 3.0).minimum_score(), 1.0);
        assert_eq!(TextKey::new("x", f64::NAN).minimum_score(), 0.0);
    }
}
