//! Data ingestion and batch storage.
//!
//! This module holds the matrix contract and its implementations:
//!
//! - [`adapter`]: conversion from columnar sources into sparse pages
//! - [`sparse_page`]: the primary row-major page and its column-major
//!   renditions
//! - [`quantized`]: the binned page and its caching parameters
//! - [`simple`]: the in-memory single-batch matrix
//! - [`batched`]: the multi-batch coordinator
//!
//! All matrix kinds are consumed through the [`DMatrix`] trait: a closed
//! set of page layouts ([`BatchKind`]) reported through [`DMatrix::supports`]
//! and iterated through [`BatchSet`].

pub mod adapter;
pub mod batched;
pub mod quantized;
pub mod simple;
pub mod sparse_page;

pub use adapter::{Column, ColumnBatch, ColumnarAdapter, ColumnarSource};
pub use batched::BatchedDMatrix;
pub use quantized::QuantizedPage;
pub use simple::SimpleDMatrix;
pub use sparse_page::{CscPage, SortedCscPage, SparsePage};

use crate::core::error::Result;
use crate::core::meta::MatrixInfo;
use crate::core::types::{BatchKind, BatchParam};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, RwLockReadGuard, RwLockWriteGuard};

/// Read access to a matrix's metadata.
///
/// Single-batch matrices hand out a plain borrow; the multi-batch
/// coordinator hands out a lock guard over its merged view. Both deref to
/// [`MatrixInfo`].
#[derive(Debug)]
pub enum InfoRef<'a> {
    /// Direct borrow of owned metadata
    Borrowed(&'a MatrixInfo),
    /// Guarded access to shared metadata
    Locked(RwLockReadGuard<'a, MatrixInfo>),
}

impl Deref for InfoRef<'_> {
    type Target = MatrixInfo;

    fn deref(&self) -> &MatrixInfo {
        match self {
            InfoRef::Borrowed(info) => info,
            InfoRef::Locked(guard) => guard,
        }
    }
}

/// Mutable access to a matrix's metadata.
///
/// Callers may overwrite label and weight vectors after construction but
/// must not change row or column counts once the primary page exists.
#[derive(Debug)]
pub enum InfoMut<'a> {
    /// Direct borrow of owned metadata
    Borrowed(&'a mut MatrixInfo),
    /// Guarded access to shared metadata
    Locked(RwLockWriteGuard<'a, MatrixInfo>),
}

impl Deref for InfoMut<'_> {
    type Target = MatrixInfo;

    fn deref(&self) -> &MatrixInfo {
        match self {
            InfoMut::Borrowed(info) => info,
            InfoMut::Locked(guard) => guard,
        }
    }
}

impl DerefMut for InfoMut<'_> {
    fn deref_mut(&mut self) -> &mut MatrixInfo {
        match self {
            InfoMut::Borrowed(info) => info,
            InfoMut::Locked(guard) => guard,
        }
    }
}

/// Iterator over a frozen, insertion-ordered sequence of pages.
///
/// The backing collection is owned and append-only before the iterator is
/// created, so iteration is an index cursor over shared pages rather than a
/// pointer walk.
#[derive(Debug)]
pub struct BatchSet<P> {
    pages: Vec<Arc<P>>,
    cursor: usize,
}

impl<P> BatchSet<P> {
    pub(crate) fn new(pages: Vec<Arc<P>>) -> Self {
        BatchSet { pages, cursor: 0 }
    }

    /// Total number of pages in the set, consumed or not.
    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }
}

impl<P> Iterator for BatchSet<P> {
    type Item = Arc<P>;

    fn next(&mut self) -> Option<Arc<P>> {
        let page = self.pages.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(page)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.pages.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl<P> ExactSizeIterator for BatchSet<P> {}

/// The data-matrix contract consumed by training code.
///
/// A matrix is polymorphic over the closed [`BatchKind`] set: it declares
/// which layouts it can produce and exposes each through a batch iterator.
/// Single-batch implementations yield exactly one page per kind; the
/// multi-batch coordinator yields one row-major page per submitted batch.
pub trait DMatrix {
    /// Shared metadata for this matrix.
    fn info(&self) -> InfoRef<'_>;

    /// Mutable metadata access. Label and weight vectors may be replaced;
    /// row and column counts must stay fixed.
    fn info_mut(&mut self) -> InfoMut<'_>;

    /// Whether all rows are visitable in a single batch pass.
    fn single_col_block(&self) -> bool;

    /// Whether this matrix kind can produce the given page layout.
    fn supports(&self, kind: BatchKind) -> bool;

    /// Iterate the row-major sparse pages.
    fn row_batches(&self) -> Result<BatchSet<SparsePage>>;

    /// Iterate the column-major pages, deriving them on first request.
    fn column_batches(&self) -> Result<BatchSet<CscPage>>;

    /// Iterate the sorted column-major pages, deriving them on first request.
    fn sorted_column_batches(&self) -> Result<BatchSet<SortedCscPage>>;

    /// Iterate the quantized pages built with `param`. The result is cached
    /// by `param`; requesting with different parameters rebuilds it.
    fn quantized_batches(&self, param: &BatchParam) -> Result<BatchSet<QuantizedPage>>;

    /// Produce a standalone matrix holding the given rows in the given order.
    fn slice(&self, rows: &[usize]) -> Result<SimpleDMatrix>;

    /// Whether quantized data exists or is expected downstream. For the
    /// multi-batch coordinator this is a routing capability flag, not a
    /// statement that a page has been materialized here.
    fn quantized_exists(&self) -> bool;

    /// Whether this matrix holds a materialized row-major sparse page.
    fn sparse_page_exists(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Entry;

    #[test]
    fn test_batch_set_cursor() {
        let pages = vec![
            Arc::new(SparsePage::new()),
            Arc::new({
                let mut p = SparsePage::new();
                p.push_row(&[Entry::new(0, 1.0)]);
                p
            }),
        ];
        let mut set = BatchSet::new(pages);
        assert_eq!(set.num_pages(), 2);
        assert_eq!(set.len(), 2);

        let first = set.next().unwrap();
        assert_eq!(first.num_rows(), 0);
        let second = set.next().unwrap();
        assert_eq!(second.num_rows(), 1);
        assert!(set.next().is_none());
        // exhausted cursor stays exhausted
        assert!(set.next().is_none());
    }
}
