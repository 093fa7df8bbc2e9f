//! Sample ingest.
//!
//! Input is line-oriented text, one sample per line:
//!
//! ```text
//! time frequency real imag [ignored...]
//! ```
//!
//! Fields are separated by any whitespace. Blank lines and `#` comments are
//! ignored. A line whose first four fields do not parse as numbers is skipped
//! and reported, it never aborts the read.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use crate::domain::Sample;
use crate::error::AppError;

/// A line that could not be turned into a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

/// Ingest output: samples in input order plus bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub samples: Vec<Sample>,
    /// Non-blank, non-comment lines seen.
    pub lines_read: usize,
    /// Lines dropped because they did not parse.
    pub lines_skipped: usize,
    pub row_errors: Vec<RowError>,
}

/// Read samples from `path`, or from stdin when `path` is `None`.
pub fn load_samples(path: Option<&Path>) -> Result<Ingested, AppError> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                AppError::usage(format!("Failed to open input '{}': {e}", path.display()))
            })?;
            read_samples(BufReader::new(file))
        }
        None => read_samples(std::io::stdin().lock()),
    }
}

/// Parse samples from any buffered reader.
///
/// Only I/O failures are errors; malformed lines are counted in
/// [`Ingested::lines_skipped`].
pub fn read_samples<R: BufRead>(reader: R) -> Result<Ingested, AppError> {
    let mut out = Ingested::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| AppError::usage(format!("Failed to read input line {line_no}: {e}")))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        out.lines_read += 1;

        match parse_line(trimmed) {
            Ok(sample) => out.samples.push(sample),
            Err(message) => {
                debug!(line = line_no, %message, "skipping input line");
                out.lines_skipped += 1;
                out.row_errors.push(RowError {
                    line: line_no,
                    message,
                });
            }
        }
    }

    if out.lines_skipped > 0 {
        warn!(
            skipped = out.lines_skipped,
            read = out.lines_read,
            "some input lines could not be parsed"
        );
    }
    debug!(samples = out.samples.len(), "ingest finished");

    Ok(out)
}

fn parse_line(line: &str) -> Result<Sample, String> {
    let mut fields = line.split_whitespace();
    let mut values = [0.0f64; 4];
    for (slot, name) in values.iter_mut().zip(["time", "frequency", "real", "imag"]) {
        let field = fields
            .next()
            .ok_or_else(|| format!("missing `{name}` field"))?;
        *slot = field
            .parse::<f64>()
            .map_err(|_| format!("invalid `{name}` value '{field}'"))?;
    }
    let [time, freq, real, imag] = values;
    Ok(Sample::new(time, freq, real, imag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_four_columns_and_ignores_extras() {
        let text = "0.5 100 1e-3 -2e-3\n1.5\t101  2e-3 -1e-3 extra 42\n";
        let ingested = read_samples(text.as_bytes()).unwrap();
        assert_eq!(ingested.samples.len(), 2);
        assert_eq!(ingested.samples[0], Sample::new(0.5, 100.0, 1e-3, -2e-3));
        assert_eq!(ingested.samples[1], Sample::new(1.5, 101.0, 2e-3, -1e-3));
        assert_eq!(ingested.lines_read, 2);
        assert_eq!(ingested.lines_skipped, 0);
    }

    #[test]
    fn skips_malformed_lines_without_failing() {
        let text = "\
# t f x y
1 100 0.1 0.2

1 100 0.1
2 abc 0.1 0.2
3 102 0.3 0.4
";
        let ingested = read_samples(text.as_bytes()).unwrap();
        assert_eq!(ingested.samples.len(), 2);
        assert_eq!(ingested.lines_read, 4);
        assert_eq!(ingested.lines_skipped, 2);
        assert_eq!(ingested.row_errors[0].line, 4);
        assert!(ingested.row_errors[0].message.contains("imag"));
        assert_eq!(ingested.row_errors[1].line, 5);
        assert!(ingested.row_errors[1].message.contains("frequency"));
    }

    #[test]
    fn keeps_input_order() {
        let text = "3 120 0 0\n1 80 0 0\n2 100 0 0\n";
        let ingested = read_samples(text.as_bytes()).unwrap();
        let times: Vec<f64> = ingested.samples.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let ingested = read_samples("".as_bytes()).unwrap();
        assert!(ingested.samples.is_empty());
        assert_eq!(ingested.lines_read, 0);
    }

    #[test]
    fn missing_file_is_a_usage_error() {
        let err = load_samples(Some(Path::new("/nonexistent/resfit/input.txt"))).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
    }
}
