//! Inspect command - show what a file contributes as a dataset.

use std::path::PathBuf;

use colored::Colorize;

use crate::cli::ColumnArgs;
use crate::input::load_file;

pub fn run(
    file: PathBuf,
    columns: ColumnArgs,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (dataset, report) = load_file(&file, &columns)?;
    let summary = dataset.summary();

    if json_output {
        let output = serde_json::json!({
            "file": file.display().to_string(),
            "rows": report.rows,
            "loaded": report.loaded,
            "skipped": report.skipped,
            "bad_cells": report.bad_cells,
            "dataset": summary,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Dataset for".cyan().bold(),
        file.display().to_string().white()
    );
    println!();

    println!("{}", "Rows:".yellow().bold());
    println!("  Read:      {}", report.rows);
    println!("  Loaded:    {}", report.loaded.to_string().green());
    if report.skipped > 0 {
        println!("  Skipped:   {}", report.skipped.to_string().yellow());
    }
    if report.bad_cells > 0 {
        println!("  Bad cells: {}", report.bad_cells.to_string().red());
    }
    println!();

    println!("{}", "Keys:".yellow().bold());
    println!("  Values:       {}", summary.values);
    println!("  Exact keys:   {}", summary.exact_keys);
    println!("  Fuzzy keys:   {} ({} types)", summary.fuzzy_keys, summary.fuzzy_types);
    println!("  Associations: {}", summary.associations);
    println!("  Max rounds:   {}", summary.max_round);
    println!();

    println!("{}", "Rankings:".yellow().bold());
    match (summary.lowest_ranking, summary.highest_ranking) {
        (Some(low), Some(high)) => {
            println!("  Ranked values: {}", summary.ranked_values);
            println!("  Range:         {} to {}", low, high);
        }
        _ => println!("  {}", "none".dimmed()),
    }

    if verbose {
        println!();
        println!("{}", "Values:".yellow().bold());
        for value in dataset.values() {
            println!("  {}", value);
        }
    }

    if let Err(e) = dataset.validate() {
        println!();
        println!("{} {}", "Warning:".red().bold(), e);
    }

    Ok(())
}
