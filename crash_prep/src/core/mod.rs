//! Core domain types and column bookkeeping for collision records.

pub mod columns;
pub mod domain;

pub use domain::{parse_crash_timestamp, GeoBounds, Outcome};
