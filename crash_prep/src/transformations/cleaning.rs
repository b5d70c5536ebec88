//! Normalization of the raw collision table.
//!
//! The cleaner runs a fixed sequence of steps. Each step is exposed on its
//! own so it can be tested in isolation, but only [`Cleaner::clean`] applies
//! them in the order the later steps depend on.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::columns::{
    self, count_values, has_column, numeric_values, require_columns, string_values,
    CLEANER_REQUIRED, COLLISION_ID, CRASH_DATE, CRASH_TIME, CYCLIST_INJURED, CYCLIST_KILLED,
    DATETIME, LATITUDE, LOCATION, LONGITUDE, MOTORIST_INJURED, MOTORIST_KILLED,
    NON_CYCLIST_COUNTS, OFF_STREET_NAME, PEDESTRIANS_INJURED, PEDESTRIANS_KILLED, PERSONS_INJURED,
    PERSONS_KILLED,
};
use crate::core::domain::{parse_crash_timestamp, GeoBounds};
use crate::error::{PipelineError, Result};

/// Row and repair counts collected while cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub invalid_coordinates: usize,
    pub dropped_missing_counts: usize,
    pub repaired_counts: usize,
    pub duplicates_removed: usize,
    pub output_rows: usize,
}

/// Outcome of the missing-count repair step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountRepair {
    pub dropped: usize,
    pub repaired: usize,
}

/// Cleaner for raw collision records.
///
/// # Examples
///
/// ```no_run
/// use crash_prep::transformations::Cleaner;
/// use polars::prelude::*;
///
/// # fn example(raw: DataFrame) -> crash_prep::Result<()> {
/// let (cleaned, report) = Cleaner::new().clean(raw)?;
/// println!("{} rows kept, {} duplicates removed", report.output_rows, report.duplicates_removed);
/// assert_eq!(cleaned.height(), report.output_rows);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    bounds: GeoBounds,
}

impl Cleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every cleaning step in order.
    pub fn clean(&self, raw: DataFrame) -> Result<(DataFrame, CleaningReport)> {
        require_columns(&raw, &CLEANER_REQUIRED)?;

        let mut report = CleaningReport {
            input_rows: raw.height(),
            ..Default::default()
        };

        // Step 1: location is fully recoverable from latitude/longitude
        let df = columns::drop_columns(raw, &[LOCATION])?;

        // Step 2: null implausible coordinates, keep the rows
        let (df, invalid) = null_invalid_coordinates(df, &self.bounds)?;
        report.invalid_coordinates = invalid;

        // Step 3: merge date and time into the leading timestamp column
        let df = insert_timestamp(df)?;

        // Step 4: off-street address is mostly empty
        let df = columns::drop_columns(df, &[OFF_STREET_NAME])?;

        // Step 5: drop or repair rows missing the total counts
        let (df, repair) = repair_missing_counts(df)?;
        report.dropped_missing_counts = repair.dropped;
        report.repaired_counts = repair.repaired;

        // Step 6: totals must now be whole, non-negative numbers
        let df = cast_total_counts(df)?;

        // Step 7
        let df = sort_by_timestamp(&df)?;

        // Step 8
        let (df, duplicates) = remove_duplicates(&df)?;
        report.duplicates_removed = duplicates;

        // Step 9: only the columns go; rows without a cyclist stay
        let df = columns::drop_columns(df, &NON_CYCLIST_COUNTS)?;

        report.output_rows = df.height();
        log::info!(
            "Cleaned {} raw rows into {} ({} invalid coordinates, {} dropped, {} repaired, {} duplicates)",
            report.input_rows,
            report.output_rows,
            report.invalid_coordinates,
            report.dropped_missing_counts,
            report.repaired_counts,
            report.duplicates_removed,
        );

        Ok((df, report))
    }
}

/// Cleans a raw collision table with the default bounding box.
pub fn clean(raw: DataFrame) -> Result<DataFrame> {
    Cleaner::new().clean(raw).map(|(df, _)| df)
}

/// Cleans a raw collision table and returns the row bookkeeping as well.
pub fn clean_with_report(raw: DataFrame) -> Result<(DataFrame, CleaningReport)> {
    Cleaner::new().clean(raw)
}

/// Nulls both coordinates of every pair outside `bounds`.
///
/// Returns the frame and the number of rows that were nulled.
pub fn null_invalid_coordinates(
    mut df: DataFrame,
    bounds: &GeoBounds,
) -> Result<(DataFrame, usize)> {
    let latitudes = numeric_values(&df, LATITUDE)?;
    let longitudes = numeric_values(&df, LONGITUDE)?;

    let mut invalid = 0;
    let (latitudes, longitudes): (Vec<Option<f64>>, Vec<Option<f64>>) = latitudes
        .into_iter()
        .zip(longitudes)
        .map(|(lat, lon)| {
            if bounds.is_plausible(lat, lon) {
                (lat, lon)
            } else {
                invalid += 1;
                (None, None)
            }
        })
        .unzip();

    df.with_column(Series::new(LATITUDE.into(), latitudes))?;
    df.with_column(Series::new(LONGITUDE.into(), longitudes))?;

    log::debug!("Nulled {} implausible coordinate pairs", invalid);
    Ok((df, invalid))
}

/// Replaces the date and time text columns with a leading `DATETIME` column.
pub fn insert_timestamp(mut df: DataFrame) -> Result<DataFrame> {
    let dates = string_values(&df, CRASH_DATE)?;
    let times = string_values(&df, CRASH_TIME)?;

    let stamps = dates
        .iter()
        .zip(&times)
        .enumerate()
        .map(|(row, pair)| match pair {
            (Some(date), Some(time)) => parse_crash_timestamp(date, time).ok_or_else(|| {
                PipelineError::Parse(format!(
                    "Cannot parse '{} {}' as a date-time at row {}",
                    date, time, row
                ))
            }),
            _ => Err(PipelineError::Parse(format!(
                "Missing crash date or time at row {}",
                row
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    let stamps = Series::new(DATETIME.into(), stamps)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    df.insert_column(0, stamps)?;
    columns::drop_columns(df, &[CRASH_DATE, CRASH_TIME])
}

fn has_injury_signal(row: usize, signals: &[Vec<Option<f64>>]) -> bool {
    signals
        .iter()
        .any(|values| values[row].is_some_and(|v| v != 0.0))
}

fn sum_present(row: usize, parts: &[&Vec<Option<f64>>]) -> f64 {
    parts.iter().filter_map(|values| values[row]).sum()
}

/// Handles rows whose total-injured count is missing.
///
/// A row with no injury or fatality recorded in any other count column is
/// dropped. Any other row gets its missing totals inferred from the victim
/// category counts. On the reference export this drops one row and sets the
/// other to one injured, none killed.
pub fn repair_missing_counts(mut df: DataFrame) -> Result<(DataFrame, CountRepair)> {
    let mut injured = numeric_values(&df, PERSONS_INJURED)?;
    let mut killed = numeric_values(&df, PERSONS_KILLED)?;
    let ids = string_values(&df, COLLISION_ID)?;

    let read_optional = |name: &str| -> Result<Vec<Option<f64>>> {
        if has_column(&df, name) {
            numeric_values(&df, name)
        } else {
            Ok(vec![None; df.height()])
        }
    };
    let pedestrians_injured = numeric_values(&df, PEDESTRIANS_INJURED)?;
    let pedestrians_killed = numeric_values(&df, PEDESTRIANS_KILLED)?;
    let motorists_injured = numeric_values(&df, MOTORIST_INJURED)?;
    let motorists_killed = numeric_values(&df, MOTORIST_KILLED)?;
    let cyclists_injured = read_optional(CYCLIST_INJURED)?;
    let cyclists_killed = read_optional(CYCLIST_KILLED)?;

    let category_injured = [&pedestrians_injured, &cyclists_injured, &motorists_injured];
    let category_killed = [&pedestrians_killed, &cyclists_killed, &motorists_killed];
    let signals = [
        killed.clone(),
        pedestrians_injured.clone(),
        pedestrians_killed.clone(),
        cyclists_injured.clone(),
        cyclists_killed.clone(),
        motorists_injured.clone(),
        motorists_killed.clone(),
    ];

    let mut repair = CountRepair::default();
    let mut keep = vec![true; df.height()];

    for row in 0..df.height() {
        if injured[row].is_some() {
            continue;
        }

        let id = ids[row].as_deref().unwrap_or("<unknown>");
        if !has_injury_signal(row, &signals) {
            log::warn!("Dropping collision {} (row {}): no injury counts at all", id, row);
            keep[row] = false;
            repair.dropped += 1;
            continue;
        }

        injured[row] = Some(sum_present(row, &category_injured));
        if killed[row].is_none() {
            killed[row] = Some(sum_present(row, &category_killed));
        }
        log::warn!(
            "Repaired collision {} (row {}): persons injured={:?}, killed={:?}",
            id,
            row,
            injured[row],
            killed[row]
        );
        repair.repaired += 1;
    }

    df.with_column(Series::new(PERSONS_INJURED.into(), injured))?;
    df.with_column(Series::new(PERSONS_KILLED.into(), killed))?;

    let df = if repair.dropped > 0 {
        columns::filter_rows(&df, &keep)?
    } else {
        df
    };

    Ok((df, repair))
}

/// Casts the total injured/killed counts to `Int64`.
///
/// Every value must be present, whole and non-negative.
pub fn cast_total_counts(mut df: DataFrame) -> Result<DataFrame> {
    for name in [PERSONS_INJURED, PERSONS_KILLED] {
        let counts = count_values(&df, name)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value {
                Some(n) if n >= 0 => Ok(n),
                Some(n) => Err(PipelineError::Validation(format!(
                    "Column '{}' has negative count {} at row {}",
                    name, n, row
                ))),
                None => Err(PipelineError::Validation(format!(
                    "Column '{}' is still missing at row {} after repair",
                    name, row
                ))),
            })
            .collect::<Result<Vec<i64>>>()?;

        df.with_column(Series::new(name.into(), counts))?;
    }

    Ok(df)
}

/// Stable sort by `DATETIME` ascending; ties keep their input order.
pub fn sort_by_timestamp(df: &DataFrame) -> Result<DataFrame> {
    Ok(df.sort(
        [DATETIME],
        SortMultipleOptions::default().with_maintain_order(true),
    )?)
}

/// Remove exact duplicate rows, keeping the first occurrence.
///
/// Rows are compared on every column, nulls included, and the survivors keep
/// their input order. Returns the frame and the number of rows removed.
pub fn remove_duplicates(df: &DataFrame) -> Result<(DataFrame, usize)> {
    let deduped = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    let removed = df.height() - deduped.height();

    if removed > 0 {
        log::debug!("Removing {} duplicate rows", removed);
    }
    Ok((deduped, removed))
}
