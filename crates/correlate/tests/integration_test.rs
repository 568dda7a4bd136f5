//! Integration tests for the correlator.

use correlate::fuzzy::{DateKey, EpisodeKey, TextKey};
use correlate::{
    CorrelateError, CorrelateOptions, Correlator, Dataset, FuzzyComparable, FuzzyKey, RankingApproach, str_to_keys,
};

fn words(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

// =============================================================================
// Smoke Tests
// =============================================================================

#[test]
fn test_smoke_pairs_like_with_like() {
    for weight_power in [0, 1] {
        let heavy = 5f64.powi(weight_power);
        let mut c = Correlator::new();
        let (a, b) = c.datasets_mut();

        a.set_keys_weighted(words("this this this Greg Greg"), "greg", heavy).unwrap();
        a.set_keys(words("This is Carol I repeat this is Carol"), "carol").unwrap();
        a.set_keys_weighted(words("Tony"), "tony", heavy).unwrap();
        a.set_keys(words("This is Steve"), "steve").unwrap();
        a.set_keys(words("blasdlkj alskdjwekj lkjaslkj"), "unmatched 1").unwrap();
        a.set_keys(words("paosdpas oasidfjoas paosfdpsaod"), "unmatched 2").unwrap();
        a.set_weighted("meredith", "meredith", 1f64.powi(weight_power)).unwrap();
        a.set_weighted("meredith", "meredith", 3f64.powi(weight_power)).unwrap();
        a.set_weighted("meredith", "meredith", heavy).unwrap();

        b.set_keys_weighted(words("this this this Greg Greg"), "greg", heavy).unwrap();
        b.set_keys(
            words("hey we found Carol this is a good idea I repeat this is Carol"),
            "carol",
        )
        .unwrap();
        b.set_keys(words("Tony over here"), "tony").unwrap();
        b.set_keys_weighted(words("This is Steve"), "steve", heavy).unwrap();
        b.set_keys(words("no correlations found"), "unmatched 3").unwrap();
        b.set_weighted("meredith", "meredith", 3f64.powi(weight_power)).unwrap();
        b.set_weighted("meredith", "meredith", 1f64.powi(weight_power)).unwrap();
        b.set_weighted("meredith", "meredith", heavy).unwrap();

        let result = c.correlate(&CorrelateOptions::default()).unwrap();

        assert_eq!(result.matches.len(), 5, "matches: {:?}", result.matches);
        for m in &result.matches {
            assert_eq!(m.value_a, m.value_b);
        }
        assert_eq!(result.unmatched_a, vec!["unmatched 1", "unmatched 2"]);
        assert_eq!(result.unmatched_b, vec!["unmatched 3"]);
        assert!(result.matches.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn test_tokenized_titles_match_filenames() {
    let mut c = Correlator::new();
    let (a, b) = c.datasets_mut();
    for title in ["The Howard Arson Matter", "The Lily Bell Matter", "The Lonely Hearts Matter"] {
        a.set_keys(str_to_keys(title), title.to_string()).unwrap();
    }
    for file in ["lily_bell_matter.mp3", "The-Howard-Arson-Matter.MP3", "lonely.hearts.matter.mp3"] {
        b.set_keys(str_to_keys(file), file.to_string()).unwrap();
    }

    let result = c.correlate(&CorrelateOptions::default()).unwrap();
    let pairs: Vec<(&str, &str)> = result
        .matches
        .iter()
        .map(|m| (m.value_a.as_str(), m.value_b.as_str()))
        .collect();

    assert_eq!(pairs.len(), 3);
    assert!(pairs.contains(&("The Howard Arson Matter", "The-Howard-Arson-Matter.MP3")));
    assert!(pairs.contains(&("The Lily Bell Matter", "lily_bell_matter.mp3")));
    assert!(pairs.contains(&("The Lonely Hearts Matter", "lonely.hearts.matter.mp3")));
}

// =============================================================================
// Scoring Tests
// =============================================================================

#[test]
fn test_single_exact_key_contributes_one() {
    let mut c = Correlator::new();
    c.dataset_a_mut().set("x", "a").unwrap();
    c.dataset_b_mut().set("x", "b").unwrap();

    let options = CorrelateOptions {
        score_ratio_bonus: 0.0,
        ..CorrelateOptions::default()
    };
    let result = c.correlate(&options).unwrap();
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].score, 1.0);
}

#[test]
fn test_common_keys_are_diluted() {
    let mut c = Correlator::new();
    let (a, b) = c.datasets_mut();
    a.set_keys(["shared", "rare"], "a1").unwrap();
    a.set("shared", "a2").unwrap();
    b.set_keys(["shared", "rare"], "b1").unwrap();

    let options = CorrelateOptions {
        score_ratio_bonus: 0.0,
        ..CorrelateOptions::default()
    };
    let result = c.correlate(&options).unwrap();
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].value_a, "a1");
    // rare: 1 * 1; shared: (1/2) * 1.
    assert_eq!(result.matches[0].score, 1.5);
}

#[test]
fn test_score_ratio_bonus_prefers_focused_pairs() {
    let mut c = Correlator::new();
    let (a, b) = c.datasets_mut();
    a.set("x", "focused").unwrap();
    a.set_keys(["y", "p", "q"], "diffuse").unwrap();
    b.set("x", "focused").unwrap();
    b.set("y", "diffuse").unwrap();

    let plain = c
        .correlate(&CorrelateOptions {
            score_ratio_bonus: 0.0,
            ..CorrelateOptions::default()
        })
        .unwrap();
    assert_eq!(plain.matches[0].score, plain.matches[1].score);

    let result = c.correlate(&CorrelateOptions::default()).unwrap();
    assert_eq!(result.matches[0].value_a, "focused");
    assert_eq!(result.matches[0].score, 2.0);
    assert_eq!(result.matches[1].value_a, "diffuse");
    assert_eq!(result.matches[1].score, 1.5);
}

#[test]
fn test_fuzzy_dates_and_episodes() {
    let mut c = Correlator::new();
    let (a, b) = c.datasets_mut();
    for (name, episode, date) in [("ep1", "1", "1949-02-11"), ("ep2", "2", "1949-02-18")] {
        let episode: EpisodeKey = episode.parse().unwrap();
        let date: DateKey = date.parse().unwrap();
        a.set_keys([FuzzyKey::new(episode), FuzzyKey::new(date)], name).unwrap();
    }
    for (name, episode, date) in [("file_a", "2", "1949-02-19"), ("file_b", "1", "1949-02-12")] {
        let episode: EpisodeKey = episode.parse().unwrap();
        let date: DateKey = date.parse().unwrap();
        b.set_keys([FuzzyKey::new(episode), FuzzyKey::new(date)], name).unwrap();
    }

    let result = c.correlate(&CorrelateOptions::default()).unwrap();
    let mut pairs: Vec<(&str, &str)> = result.matches.iter().map(|m| (m.value_a, m.value_b)).collect();
    pairs.sort();
    assert_eq!(pairs, vec![("ep1", "file_b"), ("ep2", "file_a")]);
    assert_eq!(result.statistics.candidate_pairs, 4);
}

#[test]
fn test_text_keys_tolerate_typos() {
    let mut c = Correlator::new();
    let (a, b) = c.datasets_mut();
    a.set(FuzzyKey::new(TextKey::new("The Cask of Death", 0.5)), "cask").unwrap();
    a.set(FuzzyKey::new(TextKey::new("The Salkoff Sequel", 0.5)), "salkoff").unwrap();
    b.set(FuzzyKey::new(TextKey::new("the cask of deth", 0.5)), "cask.mp3").unwrap();
    b.set(FuzzyKey::new(TextKey::new("The Salkof Sequel", 0.5)), "salkoff.mp3").unwrap();

    let result = c.correlate(&CorrelateOptions::default()).unwrap();
    let mut pairs: Vec<(&str, &str)> = result.matches.iter().map(|m| (m.value_a, m.value_b)).collect();
    pairs.sort();
    assert_eq!(pairs, vec![("cask", "cask.mp3"), ("salkoff", "salkoff.mp3")]);
}

// =============================================================================
// Ranking Tests
// =============================================================================

fn ranked_correlator() -> Correlator<&'static str> {
    let mut c = Correlator::new();
    let (a, b) = c.datasets_mut();
    for (value, ranking) in [("a1", 1.0), ("a2", 2.0)] {
        a.set("k", value).unwrap();
        a.set_ranking(value, ranking).unwrap();
    }
    for (value, ranking) in [("b1", 1.0), ("b2", 2.0)] {
        b.set("k", value).unwrap();
        b.set_ranking(value, ranking).unwrap();
    }
    c
}

#[test]
fn test_ranking_factor_keeps_order_consistent_pairs() {
    let mut c = ranked_correlator();
    let options = CorrelateOptions {
        ranking_factor: 0.5,
        ..CorrelateOptions::default()
    };
    let result = c.correlate(&options).unwrap();

    let mut pairs: Vec<(&str, &str)> = result.matches.iter().map(|m| (m.value_a, m.value_b)).collect();
    pairs.sort();
    assert_eq!(pairs, vec![("a1", "b1"), ("a2", "b2")]);
    // Both metrics agree, so the later (relative) stream wins the tie.
    assert_eq!(result.statistics.ranking_used, RankingApproach::Relative);
    for m in &result.matches {
        assert_eq!(m.score, 1.25);
    }
}

#[test]
fn test_explicit_ranking_approach_is_reported() {
    let mut c = ranked_correlator();
    let options = CorrelateOptions {
        ranking_bonus: 1.0,
        ranking: RankingApproach::Absolute,
        ..CorrelateOptions::default()
    };
    let result = c.correlate(&options).unwrap();
    assert_eq!(result.statistics.ranking_used, RankingApproach::Absolute);
    assert_eq!(result.matches.len(), 2);
    for m in &result.matches {
        assert_eq!(m.score, 2.25);
    }
}

#[test]
fn test_rankings_ignored_without_adjustment() {
    let mut c = ranked_correlator();
    let result = c.correlate(&CorrelateOptions::default()).unwrap();
    assert_eq!(result.statistics.ranking_used, RankingApproach::NotUsed);
    assert_eq!(result.matches.len(), 2);
}

#[test]
fn test_ranking_bonus_and_factor_conflict() {
    let mut c = ranked_correlator();
    let options = CorrelateOptions {
        ranking_bonus: 1.0,
        ranking_factor: 0.5,
        ..CorrelateOptions::default()
    };
    let err = c.correlate(&options).unwrap_err();
    assert!(matches!(err, CorrelateError::Config(_)));
}

// =============================================================================
// Options and Edge Cases
// =============================================================================

#[test]
fn test_minimum_score_is_strict() {
    let mut c = ranked_correlator();
    let options = CorrelateOptions {
        minimum_score: 1.25,
        ..CorrelateOptions::default()
    };
    let result = c.correlate(&options).unwrap();
    assert!(result.matches.is_empty());
    assert_eq!(result.unmatched_a, vec!["a1", "a2"]);
    assert_eq!(result.unmatched_b, vec!["b1", "b2"]);
    assert_eq!(result.minimum_score, 1.25);
    assert_eq!(result.statistics.ranking_used, RankingApproach::NotUsed);
}

#[test]
fn test_no_candidates_leaves_everything_unmatched() {
    let mut c = Correlator::new();
    c.dataset_a_mut().set("x", "a").unwrap();
    c.dataset_b_mut().set("y", "b").unwrap();
    let result = c.correlate(&CorrelateOptions::default()).unwrap();
    assert!(result.matches.is_empty());
    assert_eq!(result.unmatched_a, vec!["a"]);
    assert_eq!(result.unmatched_b, vec!["b"]);
    assert_eq!(result.statistics.candidate_pairs, 0);
}

#[test]
fn test_empty_datasets() {
    let mut c: Correlator<String> = Correlator::new();
    let result = c.correlate(&CorrelateOptions::default()).unwrap();
    assert!(result.matches.is_empty());
    assert!(result.unmatched_a.is_empty());
    assert!(result.unmatched_b.is_empty());
}

#[test]
fn test_reuse_a_lets_one_value_match_many() {
    let mut c = Correlator::new();
    let (a, b) = c.datasets_mut();
    a.set("x", "a").unwrap();
    b.set("x", "b1").unwrap();
    b.set("x", "b2").unwrap();

    let strict = c.correlate(&CorrelateOptions::default()).unwrap();
    assert_eq!(strict.matches.len(), 1);
    assert_eq!(strict.unmatched_b.len(), 1);

    let options = CorrelateOptions {
        reuse_a: true,
        ..CorrelateOptions::default()
    };
    let reused = c.correlate(&options).unwrap();
    assert_eq!(reused.matches.len(), 2);
    assert!(reused.unmatched_a.is_empty());
    assert!(reused.unmatched_b.is_empty());
}

#[test]
fn test_normalize_result() {
    let mut c = Correlator::new();
    let (a, b) = c.datasets_mut();
    a.set("x", "focused").unwrap();
    a.set_keys(["y", "p", "q"], "diffuse").unwrap();
    b.set("x", "focused").unwrap();
    b.set("y", "diffuse").unwrap();

    let mut result = c.correlate(&CorrelateOptions::default()).unwrap();
    result.normalize(None, None);
    assert_eq!(result.matches[0].score, 1.0);
    assert_eq!(result.matches[1].score, 0.75);
}

// =============================================================================
// Fuzzy Contract and Cache
// =============================================================================

#[derive(Debug, PartialEq, Eq, Hash)]
struct Overeager(u8);

impl FuzzyComparable for Overeager {
    fn compare(&self, _: &Self) -> Option<f64> {
        Some(2.0)
    }
}

#[test]
fn test_out_of_range_fuzzy_score_fails() {
    let mut c = Correlator::new();
    c.dataset_a_mut().set(FuzzyKey::new(Overeager(1)), "a").unwrap();
    c.dataset_b_mut().set(FuzzyKey::new(Overeager(2)), "b").unwrap();
    let err = c.correlate(&CorrelateOptions::default()).unwrap_err();
    assert!(matches!(err, CorrelateError::ContractViolation { score, .. } if score == 2.0));
}

#[test]
fn test_fuzzy_cache_persists_between_runs() {
    let mut c = Correlator::new();
    c.dataset_a_mut().set(FuzzyKey::new(EpisodeKey::new(3)), "a").unwrap();
    c.dataset_b_mut().set(FuzzyKey::new(EpisodeKey::new(4)), "b").unwrap();

    let first = c.correlate(&CorrelateOptions::default()).unwrap();
    assert_eq!(first.statistics.fuzzy_comparisons, 1);
    assert_eq!(c.cached_comparisons(), 1);

    c.dataset_b_mut().set(FuzzyKey::new(EpisodeKey::new(3)), "b2").unwrap();
    let second = c.correlate(&CorrelateOptions::default()).unwrap();
    assert_eq!(second.statistics.fuzzy_comparisons, 1);
    assert_eq!(c.cached_comparisons(), 2);
    assert_eq!(second.matches[0].value_b, "b2");
    assert_eq!(first.matches.len(), 1);
}

#[test]
fn test_replaced_dataset_matches_fresh_correlator() {
    let mut c = Correlator::new();
    c.dataset_a_mut().set(FuzzyKey::new(EpisodeKey::new(10)), "a-old").unwrap();
    c.dataset_b_mut().set(FuzzyKey::new(EpisodeKey::new(11)), "b").unwrap();
    let first = c.correlate(&CorrelateOptions::default()).unwrap();
    assert_eq!(first.matches.len(), 1);

    // The new dataset reuses the old key ids for a different key.
    let mut replacement = Dataset::new("a", 1.0);
    replacement.set(FuzzyKey::new(EpisodeKey::new(100)), "a-new").unwrap();
    *c.dataset_a_mut() = replacement.clone();
    let reused = c.correlate(&CorrelateOptions::default()).unwrap();

    let mut fresh = Correlator::new();
    *fresh.dataset_a_mut() = replacement;
    fresh.dataset_b_mut().set(FuzzyKey::new(EpisodeKey::new(11)), "b").unwrap();
    let expected = fresh.correlate(&CorrelateOptions::default()).unwrap();

    assert!(expected.matches.is_empty());
    assert_eq!(reused.matches, expected.matches);
    assert_eq!(reused.unmatched_a, vec!["a-new"]);
    assert_eq!(reused.unmatched_b, vec!["b"]);
}
