//! Concatenation of the labeled table with its encoded feature blocks.

use std::collections::HashSet;

use polars::prelude::*;

use crate::core::columns::{column_names, drop_columns, require_columns, OUTCOME, SUPERSEDED_FEATURES};
use crate::error::{PipelineError, Result};
use crate::features::sparse::SparseBlock;

/// Builds the feature matrix.
///
/// Column order: `outcome`, the remaining base columns in their original
/// order, then `indicators`, then each of `token_blocks` in the order given.
/// The five source columns replaced by the blocks are removed. Rows are
/// matched purely by position, so every block must have exactly as many rows
/// as `base`.
///
/// # Errors
///
/// - `Alignment` when a block height differs from the base, or when two
///   output columns would share a name
/// - `Schema` when `outcome` or a superseded source column is missing
pub fn assemble(
    base: &DataFrame,
    indicators: &SparseBlock,
    token_blocks: &[&SparseBlock],
) -> Result<DataFrame> {
    let height = base.height();
    for (label, block) in std::iter::once(("indicator", indicators))
        .chain(token_blocks.iter().map(|b| ("token", *b)))
    {
        if block.rows() != height {
            return Err(PipelineError::Alignment(format!(
                "{} block has {} rows, base table has {}",
                label,
                block.rows(),
                height
            )));
        }
    }

    require_columns(base, &[OUTCOME])?;
    let mut remaining = drop_columns(base.clone(), &SUPERSEDED_FEATURES)?;

    // Move outcome to the front.
    let outcome = remaining.drop_in_place(OUTCOME)?;
    remaining.insert_column(0, outcome)?;

    let mut seen: HashSet<String> = column_names(&remaining).into_iter().collect();
    let mut appended: Vec<Column> = Vec::new();
    for block in std::iter::once(indicators).chain(token_blocks.iter().copied()) {
        for name in block.column_names() {
            if !seen.insert(name.clone()) {
                return Err(PipelineError::Alignment(format!(
                    "Duplicate feature column: {}",
                    name
                )));
            }
        }
        appended.extend(block.to_columns());
    }

    remaining.hstack_mut(&appended)?;

    log::info!(
        "Assembled feature matrix: {} rows x {} columns ({} encoded)",
        remaining.height(),
        remaining.width(),
        appended.len()
    );
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DataFrame {
        df!(
            "DATETIME" => ["2021-09-10 09:35", "2021-09-11 02:39"],
            "borough" => ["BROOKLYN", "QUEENS"],
            "zip code" => ["11201", "11375"],
            "on street name" => ["BROADWAY", "ATLANTIC AVENUE"],
            "vehicles" => ["SEDAN", "BIKE"],
            "factors" => ["UNSPECIFIED", "UNSPECIFIED"],
            "outcome" => [0i32, 1],
        )
        .unwrap()
    }

    fn block(prefix: &str, rows: usize) -> SparseBlock {
        let mut block = SparseBlock::new(vec![format!("{}_a", prefix), format!("{}_b", prefix)]);
        for row in 0..rows {
            block.push_row(vec![(row % 2, 1)]).unwrap();
        }
        block
    }

    #[test]
    fn test_column_order_and_count() {
        let indicators = block("borough", 2);
        let vehicles = block("vehicles", 2);
        let factors = block("factors", 2);

        let matrix = assemble(&base(), &indicators, &[&vehicles, &factors]).unwrap();
        let names = column_names(&matrix);

        assert_eq!(
            names,
            vec![
                "outcome",
                "DATETIME",
                "borough_a",
                "borough_b",
                "vehicles_a",
                "vehicles_b",
                "factors_a",
                "factors_b",
            ]
        );
        // (7 base - 5 superseded - outcome) + 1 + 2 + 2 + 2
        assert_eq!(matrix.width(), 1 + 1 + 2 + 2 + 2);
        assert_eq!(matrix.height(), 2);
    }

    #[test]
    fn test_row_count_mismatch_is_alignment_error() {
        let indicators = block("borough", 2);
        let short = block("vehicles", 1);

        let err = assemble(&base(), &indicators, &[&short]).unwrap_err();
        assert!(matches!(err, PipelineError::Alignment(_)));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let indicators = block("x", 2);
        let again = block("x", 2);

        let err = assemble(&base(), &indicators, &[&again]).unwrap_err();
        assert!(matches!(err, PipelineError::Alignment(_)));
    }

    #[test]
    fn test_missing_superseded_column_is_schema_error() {
        let df = base().drop("factors").unwrap();
        let err = assemble(&df, &block("b", 2), &[]).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }
}
