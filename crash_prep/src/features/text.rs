//! Bag-of-words token counts for list-valued text columns.
//!
//! A value such as `"SEDAN STATION_WAGON SEDAN"` is split on whitespace.
//! Tokens shorter than two characters are discarded, the rest are lowercased,
//! and each row counts how often every vocabulary token occurs:
//! `sedan = 2`, `station_wagon = 1`.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::columns::{require_columns, string_values};
use crate::error::{Result, UnknownLevelWarning};
use crate::features::sparse::SparseBlock;

/// Splits a value into lowercase tokens of at least two characters.
///
/// # Examples
///
/// ```
/// use crash_prep::features::text::tokenize;
///
/// assert_eq!(tokenize("SEDAN  Bike x SEDAN"), vec!["sedan", "bike", "sedan"]);
/// assert!(tokenize("   ").is_empty());
/// ```
pub fn tokenize(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Token-count vectorizer fitted on one column.
///
/// # Examples
///
/// ```
/// use crash_prep::features::TextVectorizer;
/// use polars::prelude::*;
///
/// let df = df!("vehicles" => ["SEDAN SEDAN", "BIKE", "TAXI BIKE"]).unwrap();
/// let (block, vectorizer) = TextVectorizer::fit_transform(&df, "vehicles").unwrap();
///
/// assert_eq!(vectorizer.vocabulary(), vec!["bike", "sedan", "taxi"]);
/// assert_eq!(block.column_names(), &["vehicles_bike", "vehicles_sedan", "vehicles_taxi"]);
/// assert_eq!(block.get(0, 1), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextVectorizer {
    column: String,
    /// Token -> column index, in lexicographic token order.
    vocabulary: BTreeMap<String, usize>,
}

impl TextVectorizer {
    /// Collects the distinct tokens of `column` over every row.
    pub fn fit(df: &DataFrame, column: &str) -> Result<Self> {
        require_columns(df, &[column])?;

        let mut vocabulary: BTreeMap<String, usize> = string_values(df, column)?
            .into_iter()
            .flatten()
            .flat_map(|value| tokenize(&value))
            .map(|token| (token, 0))
            .collect();

        for (idx, position) in vocabulary.values_mut().enumerate() {
            *position = idx;
        }

        log::debug!("Column '{}' has {} tokens", column, vocabulary.len());
        Ok(Self {
            column: column.to_string(),
            vocabulary,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Vocabulary tokens in column order.
    pub fn vocabulary(&self) -> Vec<&str> {
        self.vocabulary.keys().map(String::as_str).collect()
    }

    /// Output column names, `"{column}_{token}"`.
    pub fn feature_names(&self) -> Vec<String> {
        self.vocabulary
            .keys()
            .map(|token| format!("{}_{}", self.column, token))
            .collect()
    }

    /// Counts tokens per row, returning the block and any unseen tokens.
    pub fn transform_with_warnings(
        &self,
        df: &DataFrame,
    ) -> Result<(SparseBlock, Vec<UnknownLevelWarning>)> {
        require_columns(df, &[self.column.as_str()])?;

        let mut block = SparseBlock::new(self.feature_names());
        let mut warnings = Vec::new();

        for (row, value) in string_values(df, &self.column)?.into_iter().enumerate() {
            let mut entries = Vec::new();
            for token in value.as_deref().map(tokenize).unwrap_or_default() {
                match self.vocabulary.get(&token) {
                    Some(&col) => entries.push((col, 1)),
                    None => warnings.push(UnknownLevelWarning {
                        column: self.column.clone(),
                        value: token,
                        row,
                    }),
                }
            }
            // Repeated tokens are summed by the block.
            block.push_row(entries)?;
        }

        Ok((block, warnings))
    }

    /// Counts tokens per row; unseen tokens are logged and ignored.
    pub fn transform(&self, df: &DataFrame) -> Result<SparseBlock> {
        let (block, warnings) = self.transform_with_warnings(df)?;
        for warning in &warnings {
            log::warn!("{}", warning);
        }
        Ok(block)
    }

    pub fn fit_transform(df: &DataFrame, column: &str) -> Result<(SparseBlock, Self)> {
        let vectorizer = Self::fit(df, column)?;
        let block = vectorizer.transform(df)?;
        Ok((block, vectorizer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_repeated_tokens_are_counted() {
        let df = df!("vehicles" => [Some("SEDAN SEDAN"), None, Some("Sedan PICK-UP_TRUCK")]).unwrap();
        let (block, vectorizer) = TextVectorizer::fit_transform(&df, "vehicles").unwrap();

        assert_eq!(vectorizer.vocabulary(), vec!["pick-up_truck", "sedan"]);
        assert_eq!(block.iter_nonzero(0).collect::<Vec<_>>(), vec![(1, 2)]);
        assert_eq!(block.iter_nonzero(1).count(), 0);
        assert_eq!(block.iter_nonzero(2).collect::<Vec<_>>(), vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn test_single_character_tokens_are_dropped() {
        let df = df!("factors" => ["A B UNSPECIFIED"]).unwrap();
        let (block, vectorizer) = TextVectorizer::fit_transform(&df, "factors").unwrap();
        assert_eq!(vectorizer.vocabulary(), vec!["unspecified"]);
        assert_eq!(block.cols(), 1);
    }

    #[test]
    fn test_unseen_tokens_are_reported() {
        let train = df!("factors" => ["UNSPECIFIED"]).unwrap();
        let other = df!("factors" => ["UNSPECIFIED ALCOHOL_INVOLVEMENT"]).unwrap();

        let vectorizer = TextVectorizer::fit(&train, "factors").unwrap();
        let (block, warnings) = vectorizer.transform_with_warnings(&other).unwrap();

        assert_eq!(block.get(0, 0), 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].value, "alcohol_involvement");
    }

    proptest! {
        #[test]
        fn prop_refit_is_idempotent(
            values in prop::collection::vec("[A-Za-z ]{0,24}", 1..20)
        ) {
            let df = df!("vehicles" => &values).unwrap();

            let (first_block, first) = TextVectorizer::fit_transform(&df, "vehicles").unwrap();
            let (second_block, second) = TextVectorizer::fit_transform(&df, "vehicles").unwrap();

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&first_block, &second_block);

            // Row totals equal the number of kept tokens.
            for (row, value) in values.iter().enumerate() {
                let total: u32 = first_block.iter_nonzero(row).map(|(_, v)| v).sum();
                prop_assert_eq!(total as usize, tokenize(value).len());
            }
        }
    }
}
