//! Export of fit records to JSON.
//!
//! The file holds the same record as `--format json`, so scripts can read
//! either one.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::AppError;
use crate::report::FitRecord;

/// Write `record` as pretty-printed JSON to `path`.
pub fn write_record_json(path: &Path, record: &FitRecord) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create export JSON '{}': {e}", path.display())))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, record)
        .map_err(|e| AppError::usage(format!("Failed to write export JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::usage(format!("Failed to write export JSON: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelVariant, ParameterVector, Sample};

    #[test]
    fn writes_readable_json() {
        let samples = vec![Sample::new(1.0, 100.0, 0.0, 0.0), Sample::new(2.0, 101.0, 0.0, 0.0)];
        let guess = ParameterVector::zeros(ModelVariant::OscxLoffs);
        let record = FitRecord::from_guess(&samples, &guess);

        let path = std::env::temp_dir().join(format!("resfit_export_test_{}.json", std::process::id()));
        write_record_json(&path, &record).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["variant"], "OSCX_LOFFS");
        assert_eq!(v["time"], 1.5);
        assert_eq!(v["parameters"].as_array().map(Vec::len), Some(8));
    }

    #[test]
    fn unwritable_path_is_a_usage_error() {
        let samples = vec![Sample::new(0.0, 1.0, 0.0, 0.0)];
        let record = FitRecord::from_guess(&samples, &ParameterVector::zeros(ModelVariant::OscxCoffs));
        let err = write_record_json(Path::new("/nonexistent/resfit/out.json"), &record).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
    }
}
