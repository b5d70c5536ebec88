//! Reading the raw collision export and writing prepared outputs.
//!
//! # Example
//!
//! ```no_run
//! use crash_prep::io::{write_features_csv, CrashLoader};
//! use crash_prep::preprocessing::PreparePipeline;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let raw = CrashLoader::load_csv(Path::new("crashes.csv"))?;
//! let (mut output, _) = PreparePipeline::new().run(raw)?;
//! write_features_csv(&mut output.features, Path::new("features.csv"))?;
//! # Ok(())
//! # }
//! ```

pub mod loaders;

pub use loaders::{write_features_csv, write_report_json, CrashLoader};
