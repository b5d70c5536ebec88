//! Cleaning of NYC motor vehicle collision records and preparation of
//! cyclist outcome features.
//!
//! The crate runs two stages over a `polars` [`DataFrame`](polars::prelude::DataFrame):
//!
//! 1. [`transformations::clean`] normalizes the raw export.
//! 2. [`preprocessing::PreparePipeline::prepare`] labels the cyclist outcome
//!    and expands categorical and list-valued columns into count features.
//!
//! [`io`] and [`config`] cover reading the CSV export and writing results.

pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod transformations;

pub use error::{PipelineError, Result, UnknownLevelWarning};
