//! Turning free text into exact keys.

/// Characters treated as word separators.
pub const PUNCTUATION: &str = ".?!@#$%^&*:,<>{}[]\\|_-";

/// Split `s` into lowercase word keys.
///
/// Punctuation separates words, and leading zeroes are stripped from
/// all-digit words so `"007"` and `"7"` become the same key. A word of
/// only zeroes becomes `"0"`.
///
/// ```
/// assert_eq!(
///     correlate::str_to_keys("Yours_Truly - Episode 007"),
///     vec!["yours", "truly", "episode", "7"],
/// );
/// ```
pub fn str_to_keys(s: &str) -> Vec<String> {
    let cleaned: String = s
        .to_lowercase()
        .chars()
        .map(|c| if PUNCTUATION.contains(c) { ' ' } else { c })
        .collect();

    cleaned.split_whitespace().map(strip_leading_zeroes).collect()
}

fn strip_leading_zeroes(word: &str) -> String {
    if !word.bytes().all(|b| b.is_ascii_digit()) {
        return word.to_string();
    }
    match word.trim_start_matches('0') {
        "" => "0".to_string(),
        digits => digits.to_string(),
    }
}
