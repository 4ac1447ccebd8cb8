//! Multi-batch coordinator.
//!
//! [`BatchedDMatrix`] merges a fixed number of independently built
//! single-batch matrices into one logical matrix behind the same iteration
//! contract. Producers submit concurrently; the append-and-count-check
//! sequence runs under one instance-scoped lock, and readers block on a
//! condition variable until the declared batch count has arrived.
//!
//! There is no cancellation path: a coordinator whose producers never
//! deliver the full count keeps its readers blocked. Supplying every
//! declared batch is a caller responsibility.

use crate::core::error::{MatrixError, Result};
use crate::core::meta::MatrixInfo;
use crate::core::types::{BatchKind, BatchParam};
use crate::data::quantized::QuantizedPage;
use crate::data::simple::SimpleDMatrix;
use crate::data::sparse_page::{CscPage, SortedCscPage, SparsePage};
use crate::data::{BatchSet, DMatrix, InfoMut, InfoRef};
use std::sync::{Arc, Condvar, Mutex, RwLock};

/// Submission state guarded by the coordinator's lock.
#[derive(Debug)]
struct Submissions {
    pages: Vec<Arc<SparsePage>>,
    ready: bool,
}

/// Coordination layer over multiple independently produced batches.
///
/// Starts `Collecting`, accepts exactly `target` submissions, then freezes
/// into a read-only `Ready` view exposing the submitted pages in
/// submission order.
#[derive(Debug)]
pub struct BatchedDMatrix {
    target: usize,
    state: Mutex<Submissions>,
    ready_cv: Condvar,
    info: RwLock<MatrixInfo>,
}

impl BatchedDMatrix {
    /// Create a coordinator expecting `target` submissions.
    pub fn new(target: usize) -> Self {
        BatchedDMatrix {
            target,
            state: Mutex::new(Submissions {
                pages: Vec::with_capacity(target),
                // a zero-batch coordinator has nothing to wait for
                ready: target == 0,
            }),
            ready_cv: Condvar::new(),
            info: RwLock::new(MatrixInfo::default()),
        }
    }

    /// Declared batch count fixed at construction.
    pub fn target_batches(&self) -> usize {
        self.target
    }

    /// Whether the declared batch count has been reached.
    pub fn is_ready(&self) -> bool {
        self.state.lock().expect("submission lock poisoned").ready
    }

    /// Submit one batch.
    ///
    /// Under the lock: a submission after `Ready` is rejected (dropped,
    /// with a warning) and metadata is merged in submission order
    /// otherwise. Returns `Ok(true)` exactly when this call performed the
    /// `Collecting → Ready` transition, which also wakes every reader
    /// blocked in [`row_batches`](DMatrix::row_batches).
    ///
    /// A batch whose column count disagrees with the accumulated metadata
    /// fails with a configuration error and is not recorded.
    pub fn add_batch(&self, batch: SimpleDMatrix) -> Result<bool> {
        let mut state = self.state.lock().expect("submission lock poisoned");
        if state.ready {
            log::warn!(
                "batch submitted to a coordinator already holding its {} declared batches; dropping",
                self.target
            );
            return Ok(false);
        }

        let (batch_info, page) = batch.into_parts();
        {
            let mut merged = self.info.write().expect("info lock poisoned");
            merged.merge_batch(&batch_info)?;
        }
        state.pages.push(page);

        let transitioned = state.pages.len() == self.target;
        if transitioned {
            state.ready = true;
            log::info!(
                "coordinator ready: {} batches, {} total rows",
                self.target,
                self.info.read().expect("info lock poisoned").num_row
            );
            self.ready_cv.notify_all();
        }
        Ok(transitioned)
    }
}

impl DMatrix for BatchedDMatrix {
    fn info(&self) -> InfoRef<'_> {
        InfoRef::Locked(self.info.read().expect("info lock poisoned"))
    }

    fn info_mut(&mut self) -> InfoMut<'_> {
        InfoMut::Locked(self.info.write().expect("info lock poisoned"))
    }

    fn single_col_block(&self) -> bool {
        self.target <= 1
    }

    fn supports(&self, kind: BatchKind) -> bool {
        matches!(kind, BatchKind::RowMajor)
    }

    /// Blocks until the declared batch count has arrived, then yields the
    /// submitted pages in submission order.
    fn row_batches(&self) -> Result<BatchSet<SparsePage>> {
        let mut state = self.state.lock().expect("submission lock poisoned");
        while !state.ready {
            state = self
                .ready_cv
                .wait(state)
                .expect("submission lock poisoned");
        }
        Ok(BatchSet::new(state.pages.clone()))
    }

    fn column_batches(&self) -> Result<BatchSet<CscPage>> {
        Err(MatrixError::unsupported("BatchedDMatrix::column_batches"))
    }

    fn sorted_column_batches(&self) -> Result<BatchSet<SortedCscPage>> {
        Err(MatrixError::unsupported(
            "BatchedDMatrix::sorted_column_batches",
        ))
    }

    fn quantized_batches(&self, _param: &BatchParam) -> Result<BatchSet<QuantizedPage>> {
        Err(MatrixError::unsupported(
            "BatchedDMatrix::quantized_batches",
        ))
    }

    fn slice(&self, _rows: &[usize]) -> Result<SimpleDMatrix> {
        Err(MatrixError::unsupported("BatchedDMatrix::slice"))
    }

    /// Routing flag only: quantization is expected to happen downstream of
    /// this coordinator, not here.
    fn quantized_exists(&self) -> bool {
        true
    }

    fn sparse_page_exists(&self) -> bool {
        false
    }
}
