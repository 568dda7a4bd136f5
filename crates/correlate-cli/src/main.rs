//! Correlate CLI - pair up rows of two delimited files.

mod cli;
mod commands;
mod input;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Match {
            file_a,
            file_b,
            columns,
            scoring,
            json,
        } => commands::matching::run(file_a, file_b, columns, scoring, json, cli.verbose),

        Commands::Inspect {
            file,
            columns,
            json,
        } => commands::inspect::run(file, columns, json, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr, honoring `RUST_LOG` when set.
fn init_logging(verbose: bool) {
    let default = if verbose { "correlate=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
