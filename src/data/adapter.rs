//! Adapter-driven conversion from columnar sources.
//!
//! A [`ColumnarSource`] is a sequence of materialized column batches plus
//! column names; the [`ColumnarAdapter`] wraps one together with a
//! designated label column and flattens it into a row-major [`SparsePage`]
//! and a label vector, visiting every non-missing cell exactly once.
//!
//! The physical reader that produces the column buffers (Arrow, Parquet,
//! anything else) is outside this crate; any producer that can materialize
//! `Vec<f32>` buffers with optional validity masks can feed this adapter.

use crate::core::error::{MatrixError, Result};
use crate::core::meta::MatrixInfo;
use crate::core::types::{DataSize, Entry, FeatureIndex, Label};
use crate::data::sparse_page::SparsePage;
use ndarray::Array1;
use rayon::prelude::*;

/// One materialized column buffer with an optional validity mask.
#[derive(Debug, Clone)]
pub struct Column {
    values: Vec<f32>,
    validity: Option<Vec<bool>>,
}

impl Column {
    /// A column with every cell present.
    pub fn dense(values: Vec<f32>) -> Self {
        Column {
            values,
            validity: None,
        }
    }

    /// A column with an explicit validity mask; `false` marks a null cell.
    pub fn with_validity(values: Vec<f32>, validity: Vec<bool>) -> Result<Self> {
        if values.len() != validity.len() {
            return Err(MatrixError::config(format!(
                "validity mask length {} does not match column length {}",
                validity.len(),
                values.len()
            )));
        }
        Ok(Column {
            values,
            validity: Some(validity),
        })
    }

    /// Number of cells in this column.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether this column holds no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn is_null(&self, i: usize) -> bool {
        self.validity.as_ref().map_or(false, |mask| !mask[i])
    }

    fn value(&self, i: usize) -> f32 {
        self.values[i]
    }
}

/// One batch of column buffers covering a contiguous run of rows.
#[derive(Debug, Clone)]
pub struct ColumnBatch {
    columns: Vec<Column>,
    num_rows: usize,
}

impl ColumnBatch {
    /// Create a batch from equal-length columns.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, Column::len);
        if columns.iter().any(|c| c.len() != num_rows) {
            return Err(MatrixError::config(
                "columns within a batch must have equal lengths",
            ));
        }
        Ok(ColumnBatch { columns, num_rows })
    }

    /// Rows covered by this batch.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Columns carried by this batch.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

/// A column-oriented dataset: named columns delivered as a sequence of
/// row batches stacked in order.
#[derive(Debug, Clone)]
pub struct ColumnarSource {
    column_names: Vec<String>,
    batches: Vec<ColumnBatch>,
    num_rows: usize,
}

impl ColumnarSource {
    /// Create a source from column names and batches. Every batch must
    /// carry one buffer per named column.
    pub fn new(column_names: Vec<String>, batches: Vec<ColumnBatch>) -> Result<Self> {
        for (i, batch) in batches.iter().enumerate() {
            if batch.num_columns() != column_names.len() {
                return Err(MatrixError::config(format!(
                    "batch {} has {} columns, source declares {}",
                    i,
                    batch.num_columns(),
                    column_names.len()
                )));
            }
        }
        let num_rows = batches.iter().map(ColumnBatch::num_rows).sum();
        Ok(ColumnarSource {
            column_names,
            batches,
            num_rows,
        })
    }

    /// Total row count across batches.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Column count, including the label column.
    pub fn num_columns(&self) -> usize {
        self.column_names.len()
    }

    /// Declared column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }
}

/// Missing-cell predicate: NaN cells are always absent, and a finite
/// sentinel drops exact matches as well.
#[inline]
fn is_missing(value: f32, missing: f32) -> bool {
    value.is_nan() || value == missing
}

/// Conversion shim from a [`ColumnarSource`] into the sparse row-major
/// layout, splitting out the label column.
#[derive(Debug)]
pub struct ColumnarAdapter {
    source: ColumnarSource,
    label_idx: usize,
}

impl ColumnarAdapter {
    /// Wrap a source and resolve its label column by name.
    ///
    /// A label name not present among the source's columns is a
    /// configuration error and fails the whole build.
    pub fn new(source: ColumnarSource, label_column: &str) -> Result<Self> {
        let label_idx = source
            .column_names
            .iter()
            .position(|name| name == label_column)
            .ok_or_else(|| {
                MatrixError::config(format!(
                    "label column '{}' not found in source columns {:?}",
                    label_column, source.column_names
                ))
            })?;
        Ok(ColumnarAdapter { source, label_idx })
    }

    /// Total row count.
    pub fn num_rows(&self) -> usize {
        self.source.num_rows()
    }

    /// Feature count after the label split.
    pub fn num_features(&self) -> usize {
        self.source.num_columns() - 1
    }

    /// Map a source column index into the 0-based feature space with the
    /// label column removed.
    #[inline]
    fn remap(&self, col: usize) -> FeatureIndex {
        if col < self.label_idx {
            col as FeatureIndex
        } else {
            (col - 1) as FeatureIndex
        }
    }

    /// Count the non-missing feature cells of one batch-local row.
    fn count_row(&self, batch: &ColumnBatch, local_row: usize, missing: f32) -> u64 {
        let mut count = 0u64;
        for (col, column) in batch.columns.iter().enumerate() {
            if col == self.label_idx || column.is_null(local_row) {
                continue;
            }
            if !is_missing(column.value(local_row), missing) {
                count += 1;
            }
        }
        count
    }

    /// Flatten the source into a label vector and a row-major sparse page.
    ///
    /// Runs the counting pass in parallel under a dedicated pool sized by
    /// `nthread` (`0` means one worker per CPU), then places entries
    /// sequentially into the pre-sized buffer. Row order follows the
    /// source's batch order; entries within a row are ascending by the
    /// remapped feature index.
    pub fn convert(&self, missing: f32, nthread: usize) -> Result<(MatrixInfo, SparsePage)> {
        let num_rows = self.num_rows();
        let num_features = self.num_features();
        log::info!(
            "converting columnar source: {} rows, {} features (+1 label column), {} batches",
            num_rows,
            num_features,
            self.source.batches.len()
        );

        let threads = if nthread == 0 {
            num_cpus::get()
        } else {
            nthread
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| MatrixError::config(format!("thread-count hint rejected: {}", e)))?;

        // Pass 1: per-row entry counts, parallel over each batch's rows.
        let mut counts = vec![0u64; num_rows];
        pool.install(|| {
            let mut row_offset = 0usize;
            for batch in &self.source.batches {
                counts[row_offset..row_offset + batch.num_rows()]
                    .par_iter_mut()
                    .enumerate()
                    .for_each(|(local_row, count)| {
                        *count = self.count_row(batch, local_row, missing);
                    });
                row_offset += batch.num_rows();
            }
        });

        let mut offset = Vec::with_capacity(num_rows + 1);
        offset.push(0u64);
        for r in 0..num_rows {
            offset.push(offset[r] + counts[r]);
        }
        let total_entries = *offset.last().unwrap() as usize;

        // Pass 2: place entries at each row's next free slot. Source
        // columns are visited in ascending order, so rows come out sorted
        // by the remapped index.
        let mut data = vec![Entry::new(0, 0.0); total_entries];
        let mut labels = Vec::with_capacity(num_rows);
        let mut cursor: Vec<u64> = offset[..num_rows].to_vec();
        let mut row_offset = 0usize;
        for batch in &self.source.batches {
            let label_col = &batch.columns[self.label_idx];
            for local_row in 0..batch.num_rows() {
                let row = row_offset + local_row;
                for (col, column) in batch.columns.iter().enumerate() {
                    if col == self.label_idx || column.is_null(local_row) {
                        continue;
                    }
                    let value = column.value(local_row);
                    if is_missing(value, missing) {
                        continue;
                    }
                    data[cursor[row] as usize] = Entry::new(self.remap(col), value);
                    cursor[row] += 1;
                }
                // labels are read verbatim; a null label cell becomes NaN
                labels.push(if label_col.is_null(local_row) {
                    Label::NAN
                } else {
                    label_col.value(local_row)
                });
            }
            row_offset += batch.num_rows();
        }

        let page = SparsePage { offset, data };
        let info = MatrixInfo::new(
            num_rows as DataSize,
            num_features as DataSize,
            Array1::from_vec(labels),
        )?;
        log::debug!(
            "conversion produced {} entries ({} bytes)",
            page.num_entries(),
            page.memory_size()
        );
        Ok((info, page))
    }
}
