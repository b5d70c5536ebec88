//! Column names of the collision table and typed access helpers.
//!
//! Raw columns keep the uppercase names of the collision export. Columns
//! produced by feature derivation and everything after the lowercase step use
//! lowercase names.

use polars::prelude::*;

use crate::error::{PipelineError, Result};

pub const LOCATION: &str = "LOCATION";
pub const LATITUDE: &str = "LATITUDE";
pub const LONGITUDE: &str = "LONGITUDE";
pub const CRASH_DATE: &str = "CRASH DATE";
pub const CRASH_TIME: &str = "CRASH TIME";
pub const DATETIME: &str = "DATETIME";
pub const OFF_STREET_NAME: &str = "OFF STREET NAME";
pub const ON_STREET_NAME: &str = "ON STREET NAME";
pub const BOROUGH: &str = "BOROUGH";
pub const ZIP_CODE: &str = "ZIP CODE";
pub const COLLISION_ID: &str = "COLLISION_ID";

pub const PERSONS_INJURED: &str = "NUMBER OF PERSONS INJURED";
pub const PERSONS_KILLED: &str = "NUMBER OF PERSONS KILLED";
pub const PEDESTRIANS_INJURED: &str = "NUMBER OF PEDESTRIANS INJURED";
pub const PEDESTRIANS_KILLED: &str = "NUMBER OF PEDESTRIANS KILLED";
pub const CYCLIST_INJURED: &str = "NUMBER OF CYCLIST INJURED";
pub const CYCLIST_KILLED: &str = "NUMBER OF CYCLIST KILLED";
pub const MOTORIST_INJURED: &str = "NUMBER OF MOTORIST INJURED";
pub const MOTORIST_KILLED: &str = "NUMBER OF MOTORIST KILLED";

/// Count columns that the cleaner drops once totals are repaired.
pub const NON_CYCLIST_COUNTS: [&str; 6] = [
    PERSONS_INJURED,
    PERSONS_KILLED,
    PEDESTRIANS_INJURED,
    PEDESTRIANS_KILLED,
    MOTORIST_INJURED,
    MOTORIST_KILLED,
];

/// Columns the cleaner cannot run without.
pub const CLEANER_REQUIRED: [&str; 13] = [
    LOCATION,
    LATITUDE,
    LONGITUDE,
    CRASH_DATE,
    CRASH_TIME,
    OFF_STREET_NAME,
    PERSONS_INJURED,
    PERSONS_KILLED,
    PEDESTRIANS_INJURED,
    PEDESTRIANS_KILLED,
    MOTORIST_INJURED,
    MOTORIST_KILLED,
    COLLISION_ID,
];

pub const VEHICLE_TYPE_CODES: [&str; 5] = [
    "VEHICLE TYPE CODE 1",
    "VEHICLE TYPE CODE 2",
    "VEHICLE TYPE CODE 3",
    "VEHICLE TYPE CODE 4",
    "VEHICLE TYPE CODE 5",
];

pub const CONTRIBUTING_FACTORS: [&str; 5] = [
    "CONTRIBUTING FACTOR VEHICLE 1",
    "CONTRIBUTING FACTOR VEHICLE 2",
    "CONTRIBUTING FACTOR VEHICLE 3",
    "CONTRIBUTING FACTOR VEHICLE 4",
    "CONTRIBUTING FACTOR VEHICLE 5",
];

pub const OUTCOME: &str = "outcome";
pub const FEATURE_BOROUGH: &str = "borough";
pub const FEATURE_ZIP_CODE: &str = "zip code";
pub const FEATURE_STREET: &str = "on street name";
pub const FEATURE_VEHICLES: &str = "vehicles";
pub const FEATURE_FACTORS: &str = "factors";

/// Categorical columns encoded as indicators, in output order.
pub const CATEGORICAL_FEATURES: [&str; 3] = [FEATURE_BOROUGH, FEATURE_ZIP_CODE, FEATURE_STREET];

/// Source columns the assembler drops once their encoded blocks are attached.
pub const SUPERSEDED_FEATURES: [&str; 5] = [
    FEATURE_VEHICLES,
    FEATURE_FACTORS,
    FEATURE_BOROUGH,
    FEATURE_ZIP_CODE,
    FEATURE_STREET,
];

/// Fails with a schema error naming every absent column.
pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    let present = column_names(df);
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !present.iter().any(|p| p.as_str() == *name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Schema(format!(
            "Missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|s| s.as_str() == name)
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Reads a numeric column as `f64`, keeping nulls.
///
/// A column stored as text is rejected rather than coerced.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name).map_err(|_| PipelineError::missing_column(name))?;

    // An all-null column read from CSV has no inferred type yet.
    if column.dtype() == &DataType::Null {
        return Ok(vec![None; column.len()]);
    }
    if !is_numeric(column.dtype()) {
        return Err(PipelineError::Validation(format!(
            "Column '{}' must be numeric, found {:?}",
            name,
            column.dtype()
        )));
    }

    let floats = column.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().collect())
}

/// Reads a numeric column as whole counts.
///
/// Fractional values are rejected so that a cast never silently truncates.
pub fn count_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    numeric_values(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v.fract() != 0.0 || !v.is_finite() => Err(PipelineError::Validation(
                format!("Column '{}' has non-integer count {} at row {}", name, v, row),
            )),
            Some(v) => Ok(Some(v as i64)),
            None => Ok(None),
        })
        .collect()
}

/// Reads any column as text, casting numbers to their string form.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name).map_err(|_| PipelineError::missing_column(name))?;
    if column.dtype() == &DataType::Null {
        return Ok(vec![None; column.len()]);
    }

    let text = column.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Drops the named columns, failing if any is absent.
pub fn drop_columns(df: DataFrame, names: &[&str]) -> Result<DataFrame> {
    require_columns(&df, names)?;
    Ok(df.drop_many(names.iter().copied()))
}

/// Keeps only the rows whose mask entry is `true`.
pub fn filter_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    Ok(df.filter(&mask)?)
}
