//! Sparse page storage for the data matrix engine.
//!
//! A [`SparsePage`] is the primary storage unit: a monotonically increasing
//! row-offset sequence into a flat buffer of (index, value) entries. The
//! column-major renditions ([`CscPage`], [`SortedCscPage`]) are derived from
//! it by transposition.

use crate::core::error::{MatrixError, Result};
use crate::core::types::{DataSize, Entry, FeatureIndex};
use serde::{Deserialize, Serialize};

/// Row-major sparse storage: `offset` has one slot per row plus a trailing
/// sentinel, and `data[offset[r]..offset[r + 1]]` is exactly row `r`'s
/// non-missing cells in ascending column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparsePage {
    /// Row offsets into `data`, length == rows + 1, `offset[0] == 0`
    pub offset: Vec<u64>,
    /// Flat entry buffer
    pub data: Vec<Entry>,
}

impl Default for SparsePage {
    fn default() -> Self {
        SparsePage {
            offset: vec![0],
            data: Vec::new(),
        }
    }
}

impl SparsePage {
    /// Create an empty page with zero rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows stored in this page.
    pub fn num_rows(&self) -> usize {
        self.offset.len() - 1
    }

    /// Total number of stored entries.
    pub fn num_entries(&self) -> usize {
        self.data.len()
    }

    /// The entries of row `r`.
    pub fn row(&self, r: usize) -> &[Entry] {
        let begin = self.offset[r] as usize;
        let end = self.offset[r + 1] as usize;
        &self.data[begin..end]
    }

    /// Append one row's entries.
    pub fn push_row(&mut self, entries: &[Entry]) {
        self.data.extend_from_slice(entries);
        self.offset.push(self.data.len() as u64);
    }

    /// Check the structural invariants against a column count.
    ///
    /// Offsets must start at zero and be non-decreasing, the trailing
    /// offset must equal the entry count, and every row's indices must be
    /// strictly ascending and below `num_col`.
    pub fn validate(&self, num_col: DataSize) -> Result<()> {
        if self.offset.is_empty() || self.offset[0] != 0 {
            return Err(MatrixError::format(
                "sparse page offsets must start at zero",
            ));
        }
        if *self.offset.last().unwrap() as usize != self.data.len() {
            return Err(MatrixError::format(format!(
                "trailing offset {} does not match entry count {}",
                self.offset.last().unwrap(),
                self.data.len()
            )));
        }
        if self.offset.windows(2).any(|w| w[0] > w[1]) {
            return Err(MatrixError::format("sparse page offsets decrease"));
        }
        for r in 0..self.num_rows() {
            let row = self.row(r);
            for pair in row.windows(2) {
                if pair[0].index >= pair[1].index {
                    return Err(MatrixError::format(format!(
                        "row {} column indices are not strictly ascending",
                        r
                    )));
                }
            }
            if let Some(last) = row.last() {
                if last.index as i64 >= num_col as i64 {
                    return Err(MatrixError::out_of_range(
                        last.index as usize,
                        num_col as usize,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Column-major transpose of this page.
    ///
    /// Entries are grouped by column index with the original row order
    /// preserved inside each group; the transposed entries carry the row id
    /// in their `index` field.
    pub fn get_transpose(&self, num_col: DataSize) -> CscPage {
        let num_col = num_col as usize;
        let mut counts = vec![0u64; num_col];
        for entry in &self.data {
            counts[entry.index as usize] += 1;
        }

        let mut offset = Vec::with_capacity(num_col + 1);
        offset.push(0u64);
        for c in 0..num_col {
            offset.push(offset[c] + counts[c]);
        }

        let mut cursor: Vec<u64> = offset[..num_col].to_vec();
        let mut data = vec![Entry::new(0, 0.0); self.data.len()];
        for r in 0..self.num_rows() {
            for entry in self.row(r) {
                let c = entry.index as usize;
                data[cursor[c] as usize] = Entry::new(r as FeatureIndex, entry.fvalue);
                cursor[c] += 1;
            }
        }

        CscPage(SparsePage { offset, data })
    }

    /// Build a new page holding the given rows, in the order given.
    pub(crate) fn take_rows(&self, rows: &[usize]) -> Result<SparsePage> {
        let num_rows = self.num_rows();
        let mut page = SparsePage::new();
        for &r in rows {
            if r >= num_rows {
                return Err(MatrixError::out_of_range(r, num_rows));
            }
            page.push_row(self.row(r));
        }
        Ok(page)
    }

    /// Memory footprint of the stored buffers, in bytes.
    pub fn memory_size(&self) -> usize {
        self.offset.len() * std::mem::size_of::<u64>()
            + self.data.len() * std::mem::size_of::<Entry>()
    }
}

/// Column-major page: one offset slot per column, entries carry row ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CscPage(pub SparsePage);

impl CscPage {
    /// Number of columns stored in this page.
    pub fn num_cols(&self) -> usize {
        self.0.num_rows()
    }

    /// The (row id, value) entries of column `c`, in row order.
    pub fn col(&self, c: usize) -> &[Entry] {
        self.0.row(c)
    }

    /// Sort each column's entries by value, producing the sorted rendition
    /// used for split finding.
    pub fn into_sorted(mut self) -> SortedCscPage {
        for c in 0..self.num_cols() {
            let begin = self.0.offset[c] as usize;
            let end = self.0.offset[c + 1] as usize;
            self.0.data[begin..end].sort_by(|a, b| a.fvalue.total_cmp(&b.fvalue));
        }
        SortedCscPage(self.0)
    }
}

/// Column-major page with each column's entries sorted ascending by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedCscPage(pub SparsePage);

impl SortedCscPage {
    /// Number of columns stored in this page.
    pub fn num_cols(&self) -> usize {
        self.0.num_rows()
    }

    /// The (row id, value) entries of column `c`, ascending by value.
    pub fn col(&self, c: usize) -> &[Entry] {
        self.0.row(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> SparsePage {
        // rows: [(0,1.0),(1,2.0)], [(1,3.0)], []
        let mut page = SparsePage::new();
        page.push_row(&[Entry::new(0, 1.0), Entry::new(1, 2.0)]);
        page.push_row(&[Entry::new(1, 3.0)]);
        page.push_row(&[]);
        page
    }

    #[test]
    fn test_push_row_offsets() {
        let page = sample_page();
        assert_eq!(page.num_rows(), 3);
        assert_eq!(page.offset, vec![0, 2, 3, 3]);
        assert_eq!(page.num_entries(), 3);
        assert!(page.validate(2).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let page = sample_page();
        assert!(matches!(
            page.validate(1),
            Err(MatrixError::OutOfRange { index: 1, length: 1 })
        ));
    }

    #[test]
    fn test_validate_rejects_unsorted_row() {
        let mut page = SparsePage::new();
        page.push_row(&[Entry::new(2, 1.0), Entry::new(1, 2.0)]);
        assert!(page.validate(3).is_err());
    }

    #[test]
    fn test_transpose_groups_by_column_preserving_row_order() {
        let page = sample_page();
        let csc = page.get_transpose(2);
        assert_eq!(csc.num_cols(), 2);
        assert_eq!(csc.col(0), &[Entry::new(0, 1.0)]);
        // column 1: row 0 before row 1
        assert_eq!(csc.col(1), &[Entry::new(0, 2.0), Entry::new(1, 3.0)]);
    }

    #[test]
    fn test_sorted_transpose_orders_by_value() {
        let mut page = SparsePage::new();
        page.push_row(&[Entry::new(0, 5.0)]);
        page.push_row(&[Entry::new(0, -1.0)]);
        page.push_row(&[Entry::new(0, 2.0)]);
        let sorted = page.get_transpose(1).into_sorted();
        let values: Vec<f32> = sorted.col(0).iter().map(|e| e.fvalue).collect();
        assert_eq!(values, vec![-1.0, 2.0, 5.0]);
        // row ids travel with their values
        assert_eq!(sorted.col(0)[0].index, 1);
    }

    #[test]
    fn test_take_rows_out_of_bounds() {
        let page = sample_page();
        assert!(page.take_rows(&[0, 3]).is_err());
        let sub = page.take_rows(&[1, 0]).unwrap();
        assert_eq!(sub.offset, vec![0, 1, 3]);
        assert_eq!(sub.row(0), &[Entry::new(1, 3.0)]);
    }

    #[test]
    fn test_empty_page() {
        let page = SparsePage::new();
        assert_eq!(page.num_rows(), 0);
        assert!(page.validate(0).is_ok());
        let csc = page.get_transpose(4);
        assert_eq!(csc.num_cols(), 4);
        assert!(csc.col(2).is_empty());
    }
}
