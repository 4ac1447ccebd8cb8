//! # DMatrix Rust
//!
//! A columnar-to-sparse ingestion and batch-storage engine for gradient
//! boosting training matrices. The crate converts an externally supplied
//! column-oriented dataset into a row-major sparse representation, splits
//! out the label column, and exposes the result through one
//! format-polymorphic batch-iteration interface.
//!
//! ## Features
//!
//! - **Adapter-driven conversion**: any producer of materialized column
//!   buffers feeds [`ColumnarAdapter`], which flattens the source into one
//!   contiguous sparse-entry buffer plus row offsets in a single cached
//!   pass, with a parallel counting phase under a caller-supplied thread
//!   hint.
//! - **Single-batch storage**: [`SimpleDMatrix`] owns the primary sparse
//!   page, round-trips through a magic-marked binary stream, and lazily
//!   derives column-major, sorted-column, and quantized pages, each built
//!   at most once and cached.
//! - **Multi-batch coordination**: [`BatchedDMatrix`] accepts a fixed
//!   number of concurrently produced batches under one instance-scoped
//!   lock and exposes the merged set through the same iteration contract,
//!   blocking readers until the declared count has arrived.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dmatrix_rust::{Column, ColumnBatch, ColumnarAdapter, ColumnarSource,
//!                    DMatrix, SimpleDMatrix};
//!
//! # fn main() -> dmatrix_rust::Result<()> {
//! let batch = ColumnBatch::new(vec![
//!     Column::dense(vec![1.0, 4.0]),
//!     Column::dense(vec![2.0, 5.0]),
//!     Column::dense(vec![0.0, 1.0]),
//! ])?;
//! let source = ColumnarSource::new(
//!     vec!["f0".into(), "f1".into(), "label".into()],
//!     vec![batch],
//! )?;
//!
//! let adapter = ColumnarAdapter::new(source, "label")?;
//! let matrix = SimpleDMatrix::from_adapter(&adapter, f32::NAN, 0)?;
//!
//! for page in matrix.row_batches()? {
//!     for r in 0..page.num_rows() {
//!         println!("row {}: {:?}", r, page.row(r));
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: fundamental types, error handling, and shared metadata
//! - [`data`]: the adapter, the page family, and both matrix
//!   implementations behind the [`DMatrix`] trait
//!
//! Outside this crate's scope: physical file readers (sources arrive as
//! materialized column buffers), the training algorithm consuming the
//! batches, and full quantized-page construction (the binned page here
//! carries the caching contract; histogram-grade quantization happens
//! downstream).

#![doc(html_root_url = "https://docs.rs/dmatrix-rust/")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module
pub mod core;

// Data ingestion and batch storage module
pub mod data;

// Re-export core functionality for convenience
pub use crate::core::{
    error::{MatrixError, Result},
    meta::MatrixInfo,
    types::{BatchKind, BatchParam, DataSize, Entry, FeatureIndex, Label},
};

// Re-export data functionality
pub use crate::data::{
    adapter::{Column, ColumnBatch, ColumnarAdapter, ColumnarSource},
    batched::BatchedDMatrix,
    quantized::QuantizedPage,
    simple::{SimpleDMatrix, SIMPLE_MATRIX_MAGIC},
    sparse_page::{CscPage, SortedCscPage, SparsePage},
    BatchSet, DMatrix, InfoMut, InfoRef,
};
