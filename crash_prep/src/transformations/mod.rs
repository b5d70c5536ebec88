//! Cleaning of the raw collision table.
//!
//! # Example
//!
//! ```no_run
//! use crash_prep::transformations::clean_with_report;
//! use polars::prelude::*;
//!
//! # fn example(raw: DataFrame) -> crash_prep::Result<()> {
//! let (cleaned, report) = clean_with_report(raw)?;
//! assert_eq!(cleaned.height(), report.output_rows);
//! # Ok(())
//! # }
//! ```

pub mod cleaning;

pub use cleaning::{
    cast_total_counts, clean, clean_with_report, insert_timestamp, null_invalid_coordinates,
    remove_duplicates, repair_missing_counts, sort_by_timestamp, Cleaner, CleaningReport,
    CountRepair,
};
