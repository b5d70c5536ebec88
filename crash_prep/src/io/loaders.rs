use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::core::columns::{
    column_names, string_values, COLLISION_ID, CRASH_DATE, CRASH_TIME, CYCLIST_INJURED,
    CYCLIST_KILLED, LATITUDE, LONGITUDE, MOTORIST_INJURED, MOTORIST_KILLED, PEDESTRIANS_INJURED,
    PEDESTRIANS_KILLED, PERSONS_INJURED, PERSONS_KILLED, ZIP_CODE,
};
use crate::error::PipelineError;

/// Columns read as `Float64`; integer inference would reject blanks later on.
const FLOAT_COLUMNS: [&str; 10] = [
    LATITUDE,
    LONGITUDE,
    PERSONS_INJURED,
    PERSONS_KILLED,
    PEDESTRIANS_INJURED,
    PEDESTRIANS_KILLED,
    CYCLIST_INJURED,
    CYCLIST_KILLED,
    MOTORIST_INJURED,
    MOTORIST_KILLED,
];

/// Columns kept as text whatever polars infers for them.
const TEXT_COLUMNS: [&str; 4] = [COLLISION_ID, ZIP_CODE, CRASH_DATE, CRASH_TIME];

/// Loader for the raw collision CSV export.
pub struct CrashLoader;

impl CrashLoader {
    /// Reads the export and coerces the known columns to their expected types.
    ///
    /// Columns absent from the file are left alone; the cleaner reports them.
    pub fn load_csv(csv_path: &Path) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(csv_path.into()))
            .with_context(|| format!("Failed to open {}", csv_path.display()))?
            .finish()
            .context("Failed to parse CSV into DataFrame")?;

        let present = column_names(&df);
        let has = |name: &str| present.iter().any(|p| p == name);

        let mut lazy_df = df.lazy();
        for name in TEXT_COLUMNS.into_iter().filter(|name| has(name)) {
            lazy_df = lazy_df.with_column(col(name).cast(DataType::String));
        }
        let mut df = lazy_df
            .collect()
            .context("Failed to cast columns to expected types")?;

        // Counts must never be coerced: a non-numeric cell fails the load.
        for name in FLOAT_COLUMNS.into_iter().filter(|name| has(name)) {
            cast_numeric_strict(&mut df, name)?;
        }

        log::info!(
            "Loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            csv_path.display()
        );
        Ok(df)
    }
}

/// Casts `name` to `Float64`, rejecting any value that is not a number.
fn cast_numeric_strict(df: &mut DataFrame, name: &str) -> crate::Result<()> {
    let cast = df.column(name)?.strict_cast(&DataType::Float64);
    match cast {
        Ok(column) => {
            df.with_column(column)?;
            Ok(())
        }
        Err(_) => {
            let offending = string_values(df, name)?
                .into_iter()
                .enumerate()
                .find_map(|(row, value)| {
                    value.filter(|v| v.trim().parse::<f64>().is_err()).map(|v| (row, v))
                });
            Err(PipelineError::Validation(match offending {
                Some((row, value)) => format!(
                    "Column '{}' has non-numeric value '{}' at row {}",
                    name, value, row
                ),
                None => format!("Column '{}' cannot be read as numbers", name),
            }))
        }
    }
}

/// Writes the feature matrix as CSV with a header row.
pub fn write_features_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write features to {}", path.display()))?;

    log::info!("Wrote {} feature rows to {}", df.height(), path.display());
    Ok(())
}

/// Writes a report as pretty-printed JSON.
pub fn write_report_json<T: Serialize>(report: &T, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformations::CleaningReport;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_load_csv_coerces_known_columns() {
        let csv = "CRASH DATE,CRASH TIME,ZIP CODE,LATITUDE,NUMBER OF CYCLIST INJURED,COLLISION_ID\n\
                   09/11/2021,2:39,11201,40,1,4455765\n\
                   09/10/2021,9:35,,,0,4456314\n";
        let file = create_temp_csv(csv);

        let df = CrashLoader::load_csv(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column(LATITUDE).unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column(CYCLIST_INJURED).unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column(ZIP_CODE).unwrap().dtype(), &DataType::String);
        assert_eq!(df.column(COLLISION_ID).unwrap().dtype(), &DataType::String);

        let zip = df.column(ZIP_CODE).unwrap().str().unwrap();
        assert_eq!(zip.get(0), Some("11201"));
        assert_eq!(zip.get(1), None);
    }

    #[test]
    fn test_non_numeric_count_is_validation_error() {
        let csv = "CRASH DATE,NUMBER OF PERSONS INJURED,NUMBER OF CYCLIST INJURED\n\
                   09/11/2021,1,0\n\
                   09/10/2021,abc,0\n";
        let file = create_temp_csv(csv);

        let err = CrashLoader::load_csv(file.path()).unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::Validation(message)) => {
                assert!(message.contains(PERSONS_INJURED));
                assert!(message.contains("'abc' at row 1"));
            }
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(CrashLoader::load_csv(&dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn test_written_features_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("features.csv");
        let mut df = df!(
            "outcome" => [Some(0i32), None],
            "vehicles_sedan" => [2u32, 0],
        )
        .unwrap();

        write_features_csv(&mut df, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some("outcome,vehicles_sedan"));
        assert_eq!(text.lines().nth(1), Some("0,2"));
        assert_eq!(text.lines().nth(2), Some(",0"));
    }

    #[test]
    fn test_report_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let report = CleaningReport {
            input_rows: 3,
            output_rows: 2,
            duplicates_removed: 1,
            ..Default::default()
        };

        write_report_json(&report, &path).unwrap();
        let parsed: CleaningReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, report);
    }
}
