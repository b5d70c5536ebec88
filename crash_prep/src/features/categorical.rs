//! One-hot encoding of categorical columns with a dropped baseline level.
//!
//! Levels are fitted over the whole table. Within a column the levels are
//! sorted lexicographically and the first one is the baseline, which is left
//! out of the output and shows up as an all-zero block.

use std::collections::{BTreeSet, HashMap};

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::columns::{require_columns, string_values};
use crate::error::{Result, UnknownLevelWarning};
use crate::features::sparse::SparseBlock;

/// Fitted levels of a single categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalVocabulary {
    pub column: String,
    /// All observed levels in lexicographic order; `levels[0]` is the baseline.
    pub levels: Vec<String>,
}

impl CategoricalVocabulary {
    pub fn baseline(&self) -> Option<&str> {
        self.levels.first().map(String::as_str)
    }

    /// Levels that receive an indicator column.
    pub fn encoded_levels(&self) -> &[String] {
        self.levels.get(1..).unwrap_or(&[])
    }

    /// Output column names, `"{column}_{level}"`.
    pub fn feature_names(&self) -> Vec<String> {
        self.encoded_levels()
            .iter()
            .map(|level| format!("{}_{}", self.column, level))
            .collect()
    }
}

/// Indicator encoder over a fixed, ordered set of columns.
///
/// # Examples
///
/// ```
/// use crash_prep::features::CategoricalEncoder;
/// use polars::prelude::*;
///
/// let df = df!("borough" => ["QUEENS", "BROOKLYN", "BRONX", "QUEENS"]).unwrap();
/// let (block, encoder) = CategoricalEncoder::fit_transform(&df, &["borough"]).unwrap();
///
/// // BRONX is the baseline and gets no column.
/// assert_eq!(block.column_names(), &["borough_BROOKLYN", "borough_QUEENS"]);
/// assert_eq!(encoder.vocabularies()[0].baseline(), Some("BRONX"));
/// assert_eq!(block.get(2, 0) + block.get(2, 1), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    vocabularies: Vec<CategoricalVocabulary>,
}

impl CategoricalEncoder {
    /// Discovers the levels of every listed column.
    ///
    /// Numeric columns are encoded through their text form. Missing values
    /// are not levels.
    pub fn fit(df: &DataFrame, columns: &[&str]) -> Result<Self> {
        require_columns(df, columns)?;

        let vocabularies = columns
            .iter()
            .map(|&column| {
                let levels: BTreeSet<String> =
                    string_values(df, column)?.into_iter().flatten().collect();
                log::debug!("Column '{}' has {} levels", column, levels.len());
                Ok(CategoricalVocabulary {
                    column: column.to_string(),
                    levels: levels.into_iter().collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { vocabularies })
    }

    pub fn vocabularies(&self) -> &[CategoricalVocabulary] {
        &self.vocabularies
    }

    /// Output column names in block order.
    pub fn feature_names(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(CategoricalVocabulary::feature_names)
            .collect()
    }

    /// Encodes every row, returning the block and any unseen levels.
    pub fn transform_with_warnings(
        &self,
        df: &DataFrame,
    ) -> Result<(SparseBlock, Vec<UnknownLevelWarning>)> {
        let columns: Vec<&str> = self.vocabularies.iter().map(|v| v.column.as_str()).collect();
        require_columns(df, &columns)?;

        let mut rows: Vec<Vec<(usize, u32)>> = vec![Vec::new(); df.height()];
        let mut warnings = Vec::new();
        let mut offset = 0;

        for vocabulary in &self.vocabularies {
            let positions: HashMap<&str, Option<usize>> = vocabulary
                .levels
                .iter()
                .enumerate()
                .map(|(idx, level)| (level.as_str(), idx.checked_sub(1).map(|i| offset + i)))
                .collect();

            for (row, value) in string_values(df, &vocabulary.column)?.into_iter().enumerate() {
                let Some(value) = value else {
                    continue;
                };
                match positions.get(value.as_str()) {
                    Some(Some(col)) => rows[row].push((*col, 1)),
                    // Baseline level
                    Some(None) => {}
                    None => warnings.push(UnknownLevelWarning {
                        column: vocabulary.column.clone(),
                        value,
                        row,
                    }),
                }
            }

            offset += vocabulary.encoded_levels().len();
        }

        let mut block = SparseBlock::new(self.feature_names());
        for entries in rows {
            block.push_row(entries)?;
        }

        Ok((block, warnings))
    }

    /// Encodes every row; unseen levels are logged and encode as zeros.
    pub fn transform(&self, df: &DataFrame) -> Result<SparseBlock> {
        let (block, warnings) = self.transform_with_warnings(df)?;
        for warning in &warnings {
            log::warn!("{}", warning);
        }
        Ok(block)
    }

    /// Fits on `df` and encodes the same rows.
    pub fn fit_transform(df: &DataFrame, columns: &[&str]) -> Result<(SparseBlock, Self)> {
        let encoder = Self::fit(df, columns)?;
        let block = encoder.transform(df)?;
        Ok((block, encoder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn frame() -> DataFrame {
        df!(
            "borough" => [Some("BROOKLYN"), Some("QUEENS"), None, Some("BRONX"), Some("QUEENS")],
            "zip code" => [Some(11201i64), Some(11375), Some(10451), Some(10451), None],
        )
        .unwrap()
    }

    #[test]
    fn test_k_minus_one_columns_per_block() {
        let (block, encoder) =
            CategoricalEncoder::fit_transform(&frame(), &["borough", "zip code"]).unwrap();

        // 3 boroughs and 3 zips -> 2 + 2 indicators
        assert_eq!(block.cols(), 4);
        assert_eq!(
            block.column_names(),
            &[
                "borough_BROOKLYN",
                "borough_QUEENS",
                "zip code_11201",
                "zip code_11375",
            ]
        );
        // BRONX sorts before BROOKLYN
        assert_eq!(encoder.vocabularies()[0].baseline(), Some("BRONX"));
        assert_eq!(encoder.vocabularies()[1].baseline(), Some("10451"));
    }

    #[test]
    fn test_at_most_one_hot_per_column_block() {
        let (block, _) =
            CategoricalEncoder::fit_transform(&frame(), &["borough", "zip code"]).unwrap();

        for row in 0..block.rows() {
            let borough: u32 = (0..2).map(|c| block.get(row, c)).sum();
            let zip: u32 = (2..4).map(|c| block.get(row, c)).sum();
            assert!(borough <= 1);
            assert!(zip <= 1);
        }
        assert_eq!(block.iter_nonzero(0).collect::<Vec<_>>(), vec![(0, 1), (2, 1)]);
        // Missing borough and baseline zip
        assert_eq!(block.iter_nonzero(2).count(), 0);
        // Baseline borough and baseline zip
        assert_eq!(block.iter_nonzero(3).count(), 0);
    }

    #[test]
    fn test_unseen_level_encodes_as_zeros() {
        let encoder = CategoricalEncoder::fit(&frame(), &["borough"]).unwrap();
        let other = df!("borough" => ["STATEN ISLAND", "QUEENS"]).unwrap();

        let (block, warnings) = encoder.transform_with_warnings(&other).unwrap();
        assert_eq!(block.iter_nonzero(0).count(), 0);
        assert_eq!(block.iter_nonzero(1).collect::<Vec<_>>(), vec![(1, 1)]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].value, "STATEN ISLAND");
        assert_eq!(warnings[0].row, 0);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let err = CategoricalEncoder::fit(&frame(), &["on street name"]).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }
}
