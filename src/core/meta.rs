//! Shared matrix metadata.
//!
//! [`MatrixInfo`] carries the row/column counts and the label and weight
//! vectors attached to every matrix instance, whether single-batch or
//! merged from many batches.

use crate::core::error::{MatrixError, Result};
use crate::core::types::{DataSize, Label};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Metadata attached to a matrix instance.
///
/// Labels and weights may be overwritten after construction; the row and
/// column counts must not change once the primary page exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixInfo {
    /// Number of rows
    pub num_row: DataSize,
    /// Number of feature columns, excluding the split-out label column
    pub num_col: DataSize,
    /// Target labels, length == num_row
    pub labels: Array1<Label>,
    /// Sample weights (optional), length == num_row when present
    pub weights: Option<Array1<f32>>,
}

impl Default for MatrixInfo {
    fn default() -> Self {
        MatrixInfo {
            num_row: 0,
            num_col: 0,
            labels: Array1::from_vec(Vec::new()),
            weights: None,
        }
    }
}

impl MatrixInfo {
    /// Create metadata with the given shape and labels, no weights.
    pub fn new(num_row: DataSize, num_col: DataSize, labels: Array1<Label>) -> Result<Self> {
        let info = MatrixInfo {
            num_row,
            num_col,
            labels,
            weights: None,
        };
        info.validate()?;
        Ok(info)
    }

    /// Check internal consistency of counts and vector lengths.
    pub fn validate(&self) -> Result<()> {
        if self.num_row < 0 || self.num_col < 0 {
            return Err(MatrixError::config(format!(
                "negative matrix shape: {} x {}",
                self.num_row, self.num_col
            )));
        }
        if self.labels.len() != self.num_row as usize {
            return Err(MatrixError::config(format!(
                "label vector length {} does not match row count {}",
                self.labels.len(),
                self.num_row
            )));
        }
        if let Some(ref weights) = self.weights {
            if weights.len() != self.num_row as usize {
                return Err(MatrixError::config(format!(
                    "weight vector length {} does not match row count {}",
                    weights.len(),
                    self.num_row
                )));
            }
        }
        Ok(())
    }

    /// Merge one submitted batch's metadata into this accumulated view.
    ///
    /// Row counts accumulate and label/weight vectors are concatenated in
    /// submission order. The column count is adopted from the incoming
    /// batches and must stay consistent once any rows have been merged.
    pub fn merge_batch(&mut self, other: &MatrixInfo) -> Result<()> {
        if self.num_row > 0 && self.num_col != other.num_col {
            return Err(MatrixError::config(format!(
                "batch column count {} does not match accumulated {}",
                other.num_col, self.num_col
            )));
        }
        self.num_col = other.num_col;
        self.num_row += other.num_row;

        let mut labels = self.labels.to_vec();
        labels.extend(other.labels.iter().copied());
        self.labels = Array1::from_vec(labels);

        // Weights stay None unless every merged batch carries them.
        self.weights = match (self.weights.take(), other.weights.as_ref()) {
            (Some(acc), Some(w)) => {
                let mut merged = acc.to_vec();
                merged.extend(w.iter().copied());
                Some(Array1::from_vec(merged))
            }
            _ => None,
        };
        Ok(())
    }

    /// Metadata for the given row subset, in the order given.
    ///
    /// Callers are expected to have bounds-checked `rows` against the page.
    pub(crate) fn take_rows(&self, rows: &[usize], num_col: DataSize) -> MatrixInfo {
        let labels = rows.iter().map(|&r| self.labels[r]).collect::<Vec<_>>();
        let weights = self
            .weights
            .as_ref()
            .map(|w| Array1::from_vec(rows.iter().map(|&r| w[r]).collect()));
        MatrixInfo {
            num_row: rows.len() as DataSize,
            num_col,
            labels: Array1::from_vec(labels),
            weights,
        }
    }
}
