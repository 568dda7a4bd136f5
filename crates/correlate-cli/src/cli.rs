//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use correlate::RankingApproach;
use std::path::PathBuf;

/// Correlate: pair up rows of two files by the keys they share
#[derive(Parser)]
#[command(name = "correlate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match the rows of two files and print the pairs found
    Match {
        /// First data file (CSV/TSV)
        #[arg(value_name = "FILE_A")]
        file_a: PathBuf,

        /// Second data file (CSV/TSV)
        #[arg(value_name = "FILE_B")]
        file_b: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,

        #[command(flatten)]
        scoring: ScoringArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what a file contributes as a dataset
    Inspect {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Which columns become values, keys and rankings.
#[derive(Args, Clone, Debug, Default)]
pub struct ColumnArgs {
    /// Column whose text identifies each row (default: first column)
    #[arg(long)]
    pub value_column: Option<String>,

    /// Columns tokenized into exact keys (default: the value column)
    #[arg(long, short = 'k', value_delimiter = ',')]
    pub key_columns: Vec<String>,

    /// Columns holding YYYY-MM-DD dates, compared as fuzzy keys
    #[arg(long, value_delimiter = ',')]
    pub date_columns: Vec<String>,

    /// Columns holding episode numbers (`12`, or `s3` for specials)
    #[arg(long, value_delimiter = ',')]
    pub episode_columns: Vec<String>,

    /// Columns compared as free text by edit distance
    #[arg(long, value_delimiter = ',')]
    pub text_columns: Vec<String>,

    /// Similarity a text column must exceed before it counts
    #[arg(long, default_value = "0.5")]
    pub text_minimum: f64,

    /// Numeric column used as each row's ranking
    #[arg(long, conflicts_with = "rank_by_row")]
    pub rank_column: Option<String>,

    /// Rank rows by their position in the file
    #[arg(long)]
    pub rank_by_row: bool,

    /// Field delimiter (default: detected from the file)
    #[arg(long, short = 'd')]
    pub delimiter: Option<char>,
}

/// Options forwarded to the correlator.
#[derive(Args, Clone, Debug, Default)]
pub struct ScoringArgs {
    /// Load correlation options from a JSON file; flags below override it
    #[arg(long, value_name = "JSON_FILE")]
    pub options: Option<PathBuf>,

    /// Matches must score strictly above this
    #[arg(long)]
    pub minimum_score: Option<f64>,

    /// Weight of the matched/total key ratio bonus
    #[arg(long)]
    pub score_ratio_bonus: Option<f64>,

    /// How rankings are compared (not-used, best, absolute, relative)
    #[arg(long)]
    pub ranking: Option<RankingChoice>,

    /// Bonus added in proportion to ranking agreement
    #[arg(long, conflicts_with = "ranking_factor")]
    pub ranking_bonus: Option<f64>,

    /// Fraction of each score that depends on ranking agreement
    #[arg(long)]
    pub ranking_factor: Option<f64>,

    /// Allow a row of the first file in several matches
    #[arg(long)]
    pub reuse_a: bool,

    /// Allow a row of the second file in several matches
    #[arg(long)]
    pub reuse_b: bool,

    /// Rescale scores so the best match is 1 and the minimum score is 0
    #[arg(long)]
    pub normalize: bool,
}

/// Ranking approach as spelled on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankingChoice(pub RankingApproach);

impl std::str::FromStr for RankingChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let approach = match s.to_lowercase().replace('_', "-").as_str() {
            "not-used" | "none" => RankingApproach::NotUsed,
            "best" => RankingApproach::Best,
            "absolute" => RankingApproach::Absolute,
            "relative" => RankingApproach::Relative,
            _ => {
                return Err(format!(
                    "Unknown ranking approach: {}. Use not-used, best, absolute or relative.",
                    s
                ));
            }
        };
        Ok(RankingChoice(approach))
    }
}
