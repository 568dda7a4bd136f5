//! Loading delimited files into datasets.

use std::fs;
use std::path::Path;

use correlate::fuzzy::{DateKey, EpisodeKey, TextKey};
use correlate::{Dataset, FuzzyKey, Key, str_to_keys};
use tracing::{debug, warn};

use crate::cli::ColumnArgs;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// A parsed delimited file.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: u8,
}

impl Table {
    /// Find a column by name, ignoring case and surrounding whitespace.
    pub fn column(&self, name: &str) -> Result<usize, Box<dyn std::error::Error>> {
        let wanted = name.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
            .ok_or_else(|| {
                format!(
                    "Column not found: {}\nAvailable columns: {}",
                    name,
                    self.headers.join(", ")
                )
                .into()
            })
    }
}

/// What loading a table into a dataset did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub rows: usize,
    pub loaded: usize,
    /// Rows with no value text or no usable keys.
    pub skipped: usize,
    /// Fuzzy cells that could not be parsed.
    pub bad_cells: usize,
}

/// Read a CSV/TSV file with a header row.
pub fn read_table(path: &Path, delimiter: Option<char>) -> Result<Table, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }
    let contents = fs::read(path)?;

    let delimiter = match delimiter {
        Some(d) if d.is_ascii() => d as u8,
        Some(d) => return Err(format!("Delimiter must be a single ASCII character, got '{}'", d).into()),
        None => detect_delimiter(path, &contents),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(contents.as_slice());

    let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(format!("No columns found in {}", path.display()).into());
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    debug!(
        path = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        delimiter = %(delimiter as char).escape_default(),
        "read table"
    );
    Ok(Table {
        headers,
        rows,
        delimiter,
    })
}

/// Pick a delimiter from the file extension, or else from the header line.
fn detect_delimiter(path: &Path, contents: &[u8]) -> u8 {
    match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("tsv") | Some("tab") => return b'\t',
        Some("csv") => return b',',
        _ => {}
    }

    let header = contents.split(|&b| b == b'\n').next().unwrap_or_default();
    DELIMITERS
        .iter()
        .copied()
        .max_by_key(|&d| {
            // Earlier delimiters win ties.
            let count = header.iter().filter(|&&b| b == d).count();
            (count, std::cmp::Reverse(DELIMITERS.iter().position(|&x| x == d)))
        })
        .unwrap_or(b',')
}

/// Column indices resolved against one table.
struct Columns {
    value: usize,
    exact: Vec<usize>,
    dates: Vec<usize>,
    episodes: Vec<usize>,
    texts: Vec<usize>,
    rank: Option<usize>,
}

impl Columns {
    fn resolve(table: &Table, args: &ColumnArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let value = match &args.value_column {
            Some(name) => table.column(name)?,
            None => 0,
        };
        let lookup = |names: &[String]| -> Result<Vec<usize>, Box<dyn std::error::Error>> {
            names.iter().map(|n| table.column(n)).collect()
        };

        let mut exact = lookup(&args.key_columns)?;
        let dates = lookup(&args.date_columns)?;
        let episodes = lookup(&args.episode_columns)?;
        let texts = lookup(&args.text_columns)?;
        if exact.is_empty() && dates.is_empty() && episodes.is_empty() && texts.is_empty() {
            exact.push(value);
        }
        let rank = args.rank_column.as_deref().map(|n| table.column(n)).transpose()?;

        Ok(Self {
            value,
            exact,
            dates,
            episodes,
            texts,
            rank,
        })
    }
}

/// Add every row of `table` to `dataset` as a value keyed by its columns.
///
/// The value is the text of the value column. Exact key columns are
/// tokenized with [`str_to_keys`]; fuzzy columns become one fuzzy key per
/// non-empty cell.
pub fn load_dataset(
    table: &Table,
    args: &ColumnArgs,
    dataset: &mut Dataset<String>,
) -> Result<LoadReport, Box<dyn std::error::Error>> {
    let columns = Columns::resolve(table, args)?;
    let mut report = LoadReport {
        rows: table.rows.len(),
        ..LoadReport::default()
    };

    for (index, row) in table.rows.iter().enumerate() {
        let line = index + 2;
        let value = row[columns.value].trim();
        if value.is_empty() {
            warn!(dataset = dataset.name(), line, "skipping row with empty value");
            report.skipped += 1;
            continue;
        }

        let mut keys: Vec<Key> = Vec::new();
        for &c in &columns.exact {
            keys.extend(str_to_keys(&row[c]).into_iter().map(Key::from));
        }
        for &c in &columns.dates {
            let cell = row[c].trim();
            if cell.is_empty() {
                continue;
            }
            match cell.parse::<DateKey>() {
                Ok(date) => keys.push(FuzzyKey::new(date).into()),
                Err(e) => {
                    warn!(dataset = dataset.name(), line, cell, error = %e, "unreadable date");
                    report.bad_cells += 1;
                }
            }
        }
        for &c in &columns.episodes {
            let cell = row[c].trim();
            if cell.is_empty() {
                continue;
            }
            match cell.to_lowercase().parse::<EpisodeKey>() {
                Ok(episode) => keys.push(FuzzyKey::new(episode).into()),
                Err(e) => {
                    warn!(dataset = dataset.name(), line, cell, error = %e, "unreadable episode");
                    report.bad_cells += 1;
                }
            }
        }
        for &c in &columns.texts {
            let cell = row[c].trim();
            if !cell.is_empty() {
                keys.push(FuzzyKey::new(TextKey::new(cell, args.text_minimum)).into());
            }
        }

        if keys.is_empty() {
            warn!(dataset = dataset.name(), line, value, "skipping row with no keys");
            report.skipped += 1;
            continue;
        }
        dataset.set_keys(keys, value.to_string())?;

        if let Some(c) = columns.rank {
            let cell = row[c].trim();
            if !cell.is_empty() {
                let ranking: f64 = cell.parse().map_err(|_| {
                    format!(
                        "Line {} of dataset {}: ranking '{}' is not a number",
                        line,
                        dataset.name(),
                        cell
                    )
                })?;
                dataset.set_ranking(value.to_string(), ranking)?;
            }
        } else if args.rank_by_row {
            dataset.set_ranking(value.to_string(), index as f64)?;
        }
        report.loaded += 1;
    }

    debug!(
        dataset = dataset.name(),
        loaded = report.loaded,
        skipped = report.skipped,
        "loaded dataset"
    );
    Ok(report)
}

/// Read `path` and load it into a fresh dataset named after the file.
pub fn load_file(
    path: &Path,
    args: &ColumnArgs,
) -> Result<(Dataset<String>, LoadReport), Box<dyn std::error::Error>> {
    let table = read_table(path, args.delimiter)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mut dataset = Dataset::new(name, 1.0);
    let report = load_dataset(&table, args, &mut dataset)?;
    Ok((dataset, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_table_detects_tabs() {
        let file = write_temp(".txt", "title\tyear\nThe Tears of Night\t1950\n");
        let table = read_table(file.path(), None).unwrap();
        assert_eq!(table.delimiter, b'\t');
        assert_eq!(table.headers, vec!["title", "year"]);
        assert_eq!(table.rows[0][0], "The Tears of Night");
    }

    #[test]
    fn test_read_table_pads_short_rows() {
        let file = write_temp(".csv", "title,year,host\nAlpha,1950\n");
        let table = read_table(file.path(), None).unwrap();
        assert_eq!(table.rows[0], vec!["Alpha", "1950", ""]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = read_table(Path::new("/nonexistent/file.csv"), None).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_unknown_column_lists_available() {
        let file = write_temp(".csv", "title,year\nAlpha,1950\n");
        let table = read_table(file.path(), None).unwrap();
        let err = table.column("artist").unwrap_err();
        assert!(err.to_string().contains("title, year"));
        assert_eq!(table.column(" YEAR ").unwrap(), 1);
    }

    #[test]
    fn test_load_defaults_to_tokenized_first_column() {
        let file = write_temp(".csv", "file\nhatchet_house_theft.mp3\ntears.of.night.mp3\n");
        let (dataset, report) = load_file(file.path(), &ColumnArgs::default()).unwrap();

        assert_eq!(report.loaded, 2);
        assert_eq!(dataset.len(), 2);
        let keys = dataset
            .weights(&"hatchet_house_theft.mp3".to_string(), &Key::from("hatchet"))
            .unwrap();
        assert_eq!(keys, &[1.0]);
    }

    #[test]
    fn test_load_fuzzy_and_rank_columns() {
        let file = write_temp(
            ".csv",
            "title,aired,episode,position\nPilot,1950-01-05,1,3\nFinale,not a date,s2,7\nBlank,,,\n",
        );
        let args = ColumnArgs {
            date_columns: vec!["aired".into()],
            episode_columns: vec!["episode".into()],
            rank_column: Some("position".into()),
            ..ColumnArgs::default()
        };
        let (dataset, report) = load_file(file.path(), &args).unwrap();

        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.bad_cells, 1);
        assert_eq!(dataset.ranking_bounds(), Some((3.0, 7.0)));
        let summary = dataset.summary();
        assert_eq!(summary.fuzzy_keys, 3);
        assert_eq!(summary.exact_keys, 0);
    }

    #[test]
    fn test_non_numeric_ranking_is_an_error() {
        let file = write_temp(".csv", "title,position\nPilot,first\n");
        let args = ColumnArgs {
            rank_column: Some("position".into()),
            ..ColumnArgs::default()
        };
        let err = load_file(file.path(), &args).unwrap_err();
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn test_rank_by_row_uses_file_order() {
        let file = write_temp(".csv", "title\nAlpha\nBeta\nGamma\n");
        let args = ColumnArgs {
            rank_by_row: true,
            ..ColumnArgs::default()
        };
        let (dataset, _) = load_file(file.path(), &args).unwrap();
        assert_eq!(dataset.ranking_bounds(), Some((0.0, 2.0)));
        assert_eq!(dataset.ranked_count(), 3);
    }
}
