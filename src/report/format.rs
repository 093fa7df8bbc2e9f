//! Text renderings of a [`FitRecord`].
//!
//! We keep formatting code in one place so the numerical code never touches
//! strings, and the `table` layout (consumed by downstream scripts) is pinned
//! by tests.

use crate::domain::{ModelVariant, OutputFormat};
use crate::error::AppError;
use crate::report::FitRecord;

/// Digits after the decimal point in the `table` layout.
const TABLE_PRECISION: usize = 14;

/// Render `record` in the requested layout. The result has no trailing newline.
pub fn render(record: &FitRecord, format: OutputFormat, show_zeros: bool) -> Result<String, AppError> {
    match format {
        OutputFormat::Table => Ok(format_table(record, show_zeros)),
        OutputFormat::Pairs => Ok(format_pairs(record)),
        OutputFormat::Json => format_json(record),
    }
}

/// One line: ` time residual v1 e1 v2 e2 ...`.
///
/// The time is fixed-point, everything else C-style scientific notation. With
/// `show_zeros` the line is padded with `0 0` pairs up to the largest variant.
pub fn format_table(record: &FitRecord, show_zeros: bool) -> String {
    let mut out = format!(
        " {:.prec$} {}",
        record.time,
        scientific(record.residual, TABLE_PRECISION),
        prec = TABLE_PRECISION
    );
    for p in &record.parameters {
        out.push(' ');
        out.push_str(&scientific(p.value, TABLE_PRECISION));
        out.push(' ');
        out.push_str(&scientific(p.error, TABLE_PRECISION));
    }
    if show_zeros {
        for _ in record.parameters.len()..ModelVariant::MAX_PARAMS {
            out.push_str(" 0 0");
        }
    }
    out
}

/// `name=value` lines: `time`, `residual`, then each parameter and its `_err`.
pub fn format_pairs(record: &FitRecord) -> String {
    let mut lines = vec![
        format!("time={:.prec$}", record.time, prec = TABLE_PRECISION),
        format!("residual={}", scientific(record.residual, TABLE_PRECISION)),
    ];
    for p in &record.parameters {
        lines.push(format!("{}={}", p.name, scientific(p.value, TABLE_PRECISION)));
        lines.push(format!("{}_err={}", p.name, scientific(p.error, TABLE_PRECISION)));
    }
    lines.join("\n")
}

pub fn format_json(record: &FitRecord) -> Result<String, AppError> {
    serde_json::to_string_pretty(record)
        .map_err(|e| AppError::internal(format!("Failed to serialize fit record: {e}")))
}

/// Scientific notation with a signed, at least two-digit exponent
/// (`1.50e+02`, `-3.00e-07`), as printed by C's `%e`.
pub fn scientific(v: f64, precision: usize) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let s = format!("{v:.precision$e}");
    let Some((mantissa, exponent)) = s.split_once('e') else {
        return s;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NamedValue;

    fn record() -> FitRecord {
        FitRecord {
            time: 1234.5,
            variant: ModelVariant::OscxCoffs,
            samples: 6,
            fitted: true,
            residual: 2.5e-9,
            parameters: ["A", "B", "C", "D", "w0", "dw"]
                .into_iter()
                .zip([0.0, -1e-3, 1.0, 0.25, 100.0, 5.0])
                .map(|(name, value)| NamedValue {
                    name,
                    value,
                    error: 1e-12,
                })
                .collect(),
            overload: None,
            termination: Some("Converged".to_string()),
        }
    }

    #[test]
    fn scientific_matches_c_layout() {
        assert_eq!(scientific(100.0, 2), "1.00e+02");
        assert_eq!(scientific(-3e-7, 2), "-3.00e-07");
        assert_eq!(scientific(0.0, 3), "0.000e+00");
        assert_eq!(scientific(1.5e123, 1), "1.5e+123");
        assert_eq!(scientific(f64::NAN, 2), "nan");
        assert_eq!(scientific(f64::NEG_INFINITY, 2), "-inf");
    }

    #[test]
    fn table_line_layout() {
        let line = format_table(&record(), false);
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert!(line.starts_with(' '));
        assert_eq!(fields.len(), 2 + 2 * 6);
        assert_eq!(fields[0], "1234.50000000000000");
        assert_eq!(fields[1], "2.50000000000000e-09");
        assert_eq!(fields[10], "1.00000000000000e+02");
        assert_eq!(fields[11], "1.00000000000000e-12");
    }

    #[test]
    fn show_zeros_pads_to_largest_variant() {
        let line = format_table(&record(), true);
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(fields.len(), 2 + 2 * ModelVariant::MAX_PARAMS);
        assert!(line.ends_with(" 0 0 0 0 0 0 0 0"));
    }

    #[test]
    fn pairs_are_named() {
        let text = format_pairs(&record());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2 + 2 * 6);
        assert_eq!(lines[0], "time=1234.50000000000000");
        assert!(lines.contains(&"w0=1.00000000000000e+02"));
        assert!(lines.contains(&"dw_err=1.00000000000000e-12"));
    }

    #[test]
    fn json_round_trips_through_value() {
        let text = render(&record(), OutputFormat::Json, false).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["variant"], "OSCX_COFFS");
        assert_eq!(v["parameters"][4]["name"], "w0");
        assert_eq!(v["parameters"][4]["value"], 100.0);
        assert!(v.get("overload").is_none());
    }
}
