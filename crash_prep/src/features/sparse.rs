//! Row-wise sparse storage for indicator and token-count blocks.
//!
//! Most cells of an encoded block are zero, so blocks keep only the nonzero
//! entries of each row until the assembler materializes them as dense
//! `UInt32` columns.
//!
//! # Examples
//!
//! ```
//! use crash_prep::features::SparseBlock;
//!
//! # fn main() -> crash_prep::Result<()> {
//! let mut block = SparseBlock::new(vec!["a".to_string(), "b".to_string()]);
//! block.push_row(vec![(1, 2)])?;
//! block.push_row(vec![])?;
//!
//! assert_eq!(block.rows(), 2);
//! assert_eq!(block.get(0, 1), 2);
//! assert_eq!(block.get(1, 1), 0);
//! assert_eq!(block.nnz(), 1);
//! # Ok(())
//! # }
//! ```

use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// A sparse block with named columns and entries arranged row-wise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseBlock {
    columns: Vec<String>,
    indices: Vec<Vec<usize>>,
    data: Vec<Vec<u32>>,
}

impl SparseBlock {
    /// An empty block with no rows yet.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Appends a row from `(column, value)` pairs.
    ///
    /// Pairs may come in any order; zero values are not stored and repeated
    /// columns are summed.
    ///
    /// # Errors
    ///
    /// `Alignment` if a column index is out of range. The block is left
    /// unchanged.
    pub fn push_row(&mut self, mut entries: Vec<(usize, u32)>) -> Result<()> {
        if let Some(&(col, _)) = entries.iter().find(|&&(col, _)| col >= self.columns.len()) {
            return Err(PipelineError::Alignment(format!(
                "Column index {} out of range for a block of {} columns",
                col,
                self.columns.len()
            )));
        }
        entries.sort_unstable_by_key(|&(col, _)| col);

        let mut row_indices: Vec<usize> = Vec::with_capacity(entries.len());
        let mut row_data: Vec<u32> = Vec::with_capacity(entries.len());

        for (col, value) in entries {
            if value == 0 {
                continue;
            }
            match row_indices.last() {
                Some(&last) if last == col => {
                    if let Some(total) = row_data.last_mut() {
                        *total += value;
                    }
                }
                _ => {
                    row_indices.push(col);
                    row_data.push(value);
                }
            }
        }

        self.indices.push(row_indices);
        self.data.push(row_data);
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.indices.len()
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Return the number of nonzero entries.
    pub fn nnz(&self) -> usize {
        self.indices.iter().map(Vec::len).sum()
    }

    /// Value at `(row, col)`; zero when not stored.
    pub fn get(&self, row: usize, col: usize) -> u32 {
        match self.indices[row].binary_search(&col) {
            Ok(idx) => self.data[row][idx],
            Err(_) => 0,
        }
    }

    /// Nonzero `(column, value)` entries of a row, in column order.
    pub fn iter_nonzero(&self, row: usize) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.indices[row]
            .iter()
            .copied()
            .zip(self.data[row].iter().copied())
    }

    /// Sum of each row; used to check one-hot blocks.
    pub fn row_sums(&self) -> Vec<u32> {
        self.data.iter().map(|row| row.iter().sum()).collect()
    }

    /// Materializes the block as dense `UInt32` columns.
    pub fn to_columns(&self) -> Vec<Column> {
        let mut dense: Vec<Vec<u32>> = vec![vec![0; self.rows()]; self.cols()];

        for row in 0..self.rows() {
            for (col, value) in self.iter_nonzero(row) {
                dense[col][row] = value;
            }
        }

        self.columns
            .iter()
            .zip(dense)
            .map(|(name, values)| Series::new(name.as_str().into(), values).into())
            .collect()
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(self.to_columns())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{}", i)).collect()
    }

    #[test]
    fn test_push_row_sorts_and_merges() {
        let mut block = SparseBlock::new(names(3));
        block.push_row(vec![(2, 1), (0, 1), (2, 1), (1, 0)]).unwrap();

        assert_eq!(block.iter_nonzero(0).collect::<Vec<_>>(), vec![(0, 1), (2, 2)]);
        assert_eq!(block.nnz(), 2);
        assert_eq!(block.row_sums(), vec![3]);
    }

    #[test]
    fn test_push_row_out_of_range_is_rejected() {
        let mut block = SparseBlock::new(names(1));
        block.push_row(vec![(0, 1)]).unwrap();

        let err = block.push_row(vec![(0, 1), (1, 1)]).unwrap_err();
        assert!(matches!(err, PipelineError::Alignment(_)));
        assert_eq!(block.rows(), 1);
        assert_eq!(block.nnz(), 1);
    }

    #[test]
    fn test_to_dataframe_is_dense() {
        let mut block = SparseBlock::new(names(2));
        block.push_row(vec![(0, 1)]).unwrap();
        block.push_row(vec![]).unwrap();
        block.push_row(vec![(1, 3)]).unwrap();

        let df = block.to_dataframe().unwrap();
        assert_eq!(df.shape(), (3, 2));

        let c0 = df.column("c0").unwrap().u32().unwrap();
        let c1 = df.column("c1").unwrap().u32().unwrap();
        assert_eq!(c0.into_iter().collect::<Vec<_>>(), vec![Some(1), Some(0), Some(0)]);
        assert_eq!(c1.into_iter().collect::<Vec<_>>(), vec![Some(0), Some(0), Some(3)]);
    }
}
