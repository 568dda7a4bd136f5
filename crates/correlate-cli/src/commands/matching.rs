//! Match command - correlate two files and print the pairs found.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use correlate::{CorrelateOptions, Correlator, CorrelatorResult};

use crate::cli::{ColumnArgs, ScoringArgs};
use crate::input::{load_dataset, read_table};

pub fn run(
    file_a: PathBuf,
    file_b: PathBuf,
    columns: ColumnArgs,
    scoring: ScoringArgs,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(&scoring)?;

    let table_a = read_table(&file_a, columns.delimiter)?;
    let table_b = read_table(&file_b, columns.delimiter)?;

    let mut correlator = Correlator::new();
    let report_a = load_dataset(&table_a, &columns, correlator.dataset_a_mut())?;
    let report_b = load_dataset(&table_b, &columns, correlator.dataset_b_mut())?;

    let mut result = correlator.correlate(&options)?;
    if scoring.normalize {
        result.normalize(None, None);
    }

    if json_output {
        let output = serde_json::json!({
            "file_a": file_a.display().to_string(),
            "file_b": file_b.display().to_string(),
            "options": options,
            "total_score": result.total_score(),
            "matches": result.matches,
            "unmatched_a": result.unmatched_a,
            "unmatched_b": result.unmatched_b,
            "statistics": result.statistics,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} {} {}",
        "Correlating".cyan().bold(),
        file_a.display().to_string().white(),
        "with".cyan(),
        file_b.display().to_string().white()
    );
    if report_a.skipped + report_b.skipped > 0 {
        println!(
            "  {} rows skipped (no value or no keys)",
            (report_a.skipped + report_b.skipped).to_string().yellow()
        );
    }
    println!();

    print_matches(&result);
    print_unmatched("Unmatched in", &file_a, &result.unmatched_a);
    print_unmatched("Unmatched in", &file_b, &result.unmatched_b);

    println!(
        "{} {} matched, {} + {} unmatched, total score {:.3}",
        "Summary:".yellow().bold(),
        result.matches.len().to_string().green(),
        result.unmatched_a.len(),
        result.unmatched_b.len(),
        result.total_score()
    );

    if verbose {
        let stats = &result.statistics;
        println!();
        println!("{}", "Statistics:".yellow().bold());
        println!("  Candidate pairs:   {}", stats.candidate_pairs);
        println!("  Scored matches:    {}", stats.scored_matches);
        println!("  Fuzzy comparisons: {}", stats.fuzzy_comparisons);
        println!("  Boiler branches:   {}", stats.boiler_hypotheses);
        println!("  Ranking:           {}", stats.ranking_used);
        println!("  Elapsed:           {:?}", stats.timings.elapsed);
    }

    Ok(())
}

/// Start from the options file if given, then apply flag overrides.
fn build_options(scoring: &ScoringArgs) -> Result<CorrelateOptions, Box<dyn std::error::Error>> {
    let mut options = match &scoring.options {
        Some(path) => load_options(path)?,
        None => CorrelateOptions::default(),
    };

    if let Some(v) = scoring.minimum_score {
        options.minimum_score = v;
    }
    if let Some(v) = scoring.score_ratio_bonus {
        options.score_ratio_bonus = v;
    }
    if let Some(choice) = scoring.ranking {
        options.ranking = choice.0;
    }
    if let Some(v) = scoring.ranking_bonus {
        options.ranking_bonus = v;
    }
    if let Some(v) = scoring.ranking_factor {
        options.ranking_factor = v;
    }
    options.reuse_a |= scoring.reuse_a;
    options.reuse_b |= scoring.reuse_b;

    options.validate()?;
    Ok(options)
}

fn load_options(path: &Path) -> Result<CorrelateOptions, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Options file not found: {}", path.display()).into());
    }
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| format!("Invalid options file {}: {}", path.display(), e).into())
}

fn print_matches(result: &CorrelatorResult<String>) {
    if result.matches.is_empty() {
        println!("{}", "No matches found.".yellow());
        println!();
        return;
    }

    println!("{}", "Matches:".yellow().bold());
    for m in &result.matches {
        println!(
            "  {:>8}  {}  {}  {}",
            format!("{:.3}", m.score).green(),
            m.value_a.white(),
            "<->".dimmed(),
            m.value_b.white()
        );
    }
    println!();
}

fn print_unmatched(label: &str, file: &Path, values: &[String]) {
    if values.is_empty() {
        return;
    }
    println!(
        "{} {} ({}):",
        label.yellow().bold(),
        file.display().to_string().white(),
        values.len()
    );
    for value in values {
        println!("  {}", value.dimmed());
    }
    println!();
}
