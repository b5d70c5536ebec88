use std::collections::HashSet;

use polars::prelude::*;
use serde::Serialize;

use crate::core::columns::{
    column_names, drop_columns, CATEGORICAL_FEATURES, COLLISION_ID, FEATURE_FACTORS,
    FEATURE_VEHICLES, LATITUDE, LONGITUDE, OUTCOME,
};
use crate::error::{PipelineError, Result, UnknownLevelWarning};
use crate::features::{
    assemble, label_outcome, CategoricalEncoder, CrashFeatureDeriver, FeatureDeriver,
    TextVectorizer,
};
use crate::transformations::{Cleaner, CleaningReport};

/// Shape summary of a prepared feature matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrepareReport {
    pub rows: usize,
    pub unlabeled_rows: usize,
    pub base_columns: usize,
    pub indicator_columns: usize,
    pub vehicle_tokens: usize,
    pub factor_tokens: usize,
    pub total_columns: usize,
}

/// Result of the prepare stage.
///
/// The fitted encoder and vectorizers are kept so the column layout of
/// `features` can be traced back to levels and tokens.
#[derive(Debug, Clone)]
pub struct PrepareOutput {
    pub features: DataFrame,
    pub encoder: CategoricalEncoder,
    pub vehicles: TextVectorizer,
    pub factors: TextVectorizer,
    pub warnings: Vec<UnknownLevelWarning>,
    pub report: PrepareReport,
}

/// Combined bookkeeping of a full clean + prepare run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub cleaning: CleaningReport,
    pub preparation: PrepareReport,
    pub warnings: Vec<UnknownLevelWarning>,
}

/// Clean and prepare stages over a collision table.
///
/// The deriver is the only pluggable part; everything else follows the fixed
/// column layout of the collision export.
///
/// # Examples
///
/// ```no_run
/// use crash_prep::preprocessing::PreparePipeline;
/// use polars::prelude::*;
///
/// # fn example(raw: DataFrame) -> crash_prep::Result<()> {
/// let (output, report) = PreparePipeline::new().run(raw)?;
/// assert_eq!(output.features.height(), report.cleaning.output_rows);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PreparePipeline<D: FeatureDeriver = CrashFeatureDeriver> {
    cleaner: Cleaner,
    deriver: D,
}

impl PreparePipeline<CrashFeatureDeriver> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: FeatureDeriver> PreparePipeline<D> {
    /// Pipeline with a custom feature deriver.
    pub fn with_deriver(deriver: D) -> Self {
        Self {
            cleaner: Cleaner::new(),
            deriver,
        }
    }

    pub fn clean(&self, raw: DataFrame) -> Result<(DataFrame, CleaningReport)> {
        self.cleaner.clean(raw)
    }

    /// Turns a cleaned table into the feature matrix.
    ///
    /// Levels and vocabularies are fitted on the whole table before it is
    /// encoded, so every row shares one column layout.
    pub fn prepare(&self, cleaned: DataFrame) -> Result<PrepareOutput> {
        // Step 1: coordinates and identifiers carry no signal
        let df = drop_columns(cleaned, &[LATITUDE, LONGITUDE, COLLISION_ID])?;

        // Step 2
        let df = label_outcome(&df)?;
        let unlabeled_rows = df.column(OUTCOME)?.null_count();

        // Step 3: blocks are matched by position, so the row count must hold
        let height = df.height();
        let df = self.deriver.derive_features(df)?;
        if df.height() != height {
            return Err(PipelineError::Alignment(format!(
                "Feature deriver returned {} rows for {} input rows",
                df.height(),
                height
            )));
        }

        // Step 4
        let df = lowercase_column_names(df)?;

        // Step 5
        let encoder = CategoricalEncoder::fit(&df, &CATEGORICAL_FEATURES)?;
        let (indicators, mut warnings) = encoder.transform_with_warnings(&df)?;

        // Step 6: vehicles first, then factors
        let vehicles = TextVectorizer::fit(&df, FEATURE_VEHICLES)?;
        let (vehicle_block, vehicle_warnings) = vehicles.transform_with_warnings(&df)?;
        let factors = TextVectorizer::fit(&df, FEATURE_FACTORS)?;
        let (factor_block, factor_warnings) = factors.transform_with_warnings(&df)?;
        warnings.extend(vehicle_warnings);
        warnings.extend(factor_warnings);

        for warning in &warnings {
            log::warn!("{}", warning);
        }

        // Step 7
        let features = assemble(&df, &indicators, &[&vehicle_block, &factor_block])?;

        let report = PrepareReport {
            rows: features.height(),
            unlabeled_rows,
            base_columns: features.width()
                - indicators.cols()
                - vehicle_block.cols()
                - factor_block.cols(),
            indicator_columns: indicators.cols(),
            vehicle_tokens: vehicle_block.cols(),
            factor_tokens: factor_block.cols(),
            total_columns: features.width(),
        };

        log::info!(
            "Prepared {} rows: {} base, {} indicator, {} vehicle and {} factor columns",
            report.rows,
            report.base_columns,
            report.indicator_columns,
            report.vehicle_tokens,
            report.factor_tokens,
        );

        Ok(PrepareOutput {
            features,
            encoder,
            vehicles,
            factors,
            warnings,
            report,
        })
    }

    /// Cleans and prepares `raw` in one go.
    pub fn run(&self, raw: DataFrame) -> Result<(PrepareOutput, PipelineReport)> {
        let (cleaned, cleaning) = self.clean(raw)?;
        let output = self.prepare(cleaned)?;

        let report = PipelineReport {
            cleaning,
            preparation: output.report.clone(),
            warnings: output.warnings.clone(),
        };
        Ok((output, report))
    }
}

/// Lowercases every column name.
///
/// Two names that only differ in case would collide, which is an error.
pub fn lowercase_column_names(mut df: DataFrame) -> Result<DataFrame> {
    let lowered: Vec<String> = column_names(&df)
        .into_iter()
        .map(|name| name.to_lowercase())
        .collect();

    let mut seen = HashSet::new();
    for name in &lowered {
        if !seen.insert(name.as_str()) {
            return Err(PipelineError::Alignment(format!(
                "Column names collide after lowercasing: {}",
                name
            )));
        }
    }

    df.set_column_names(lowered)?;
    Ok(df)
}
