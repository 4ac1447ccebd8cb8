//! In-memory single-batch matrix.
//!
//! [`SimpleDMatrix`] owns exactly one primary [`SparsePage`] plus lazily
//! constructed derived pages. It is built once, from an adapter pass or a
//! restored byte stream, and is immutable afterwards except for the derived
//! caches and metadata vector overwrites.

use crate::core::error::{MatrixError, Result};
use crate::core::meta::MatrixInfo;
use crate::core::types::{BatchKind, BatchParam};
use crate::data::adapter::ColumnarAdapter;
use crate::data::quantized::QuantizedPage;
use crate::data::sparse_page::{CscPage, SortedCscPage, SparsePage};
use crate::data::{BatchSet, DMatrix, InfoMut, InfoRef};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Magic marker identifying a serialized single-batch matrix stream.
pub const SIMPLE_MATRIX_MAGIC: u32 = 0xffff_ab01;

/// Single-batch, in-memory matrix: one primary sparse page, metadata, and
/// at-most-once caches for the derived page kinds.
#[derive(Debug)]
pub struct SimpleDMatrix {
    info: MatrixInfo,
    sparse_page: Arc<SparsePage>,
    column_page: OnceLock<Arc<CscPage>>,
    sorted_column_page: OnceLock<Arc<SortedCscPage>>,
    quantized_page: Mutex<Option<(BatchParam, Arc<QuantizedPage>)>>,
    derived_builds: AtomicUsize,
}

impl SimpleDMatrix {
    /// Build from an adapter pass.
    ///
    /// `missing` is the sentinel treated as absent (NaN cells are always
    /// absent); `nthread` is a hint for the conversion's counting pass and
    /// is not retained.
    pub fn from_adapter(adapter: &ColumnarAdapter, missing: f32, nthread: usize) -> Result<Self> {
        let (info, page) = adapter.convert(missing, nthread)?;
        Self::from_parts(info, page)
    }

    /// Build from already-validated parts.
    pub fn from_parts(info: MatrixInfo, page: SparsePage) -> Result<Self> {
        info.validate()?;
        if page.num_rows() != info.num_row as usize {
            return Err(MatrixError::config(format!(
                "page holds {} rows, metadata declares {}",
                page.num_rows(),
                info.num_row
            )));
        }
        page.validate(info.num_col)?;
        Ok(SimpleDMatrix {
            info,
            sparse_page: Arc::new(page),
            column_page: OnceLock::new(),
            sorted_column_page: OnceLock::new(),
            quantized_page: Mutex::new(None),
            derived_builds: AtomicUsize::new(0),
        })
    }

    /// Restore a matrix from a serialized stream.
    ///
    /// The stream must begin with [`SIMPLE_MATRIX_MAGIC`]; any other
    /// marker fails with a format error before the payload is touched.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        let magic = u32::from_le_bytes(magic);
        if magic != SIMPLE_MATRIX_MAGIC {
            return Err(MatrixError::format(format!(
                "magic marker mismatch: expected {:#010x}, found {:#010x}",
                SIMPLE_MATRIX_MAGIC, magic
            )));
        }
        let (info, page): (MatrixInfo, SparsePage) = bincode::deserialize_from(reader)?;
        Self::from_parts(info, page)
    }

    /// Serialize this matrix's metadata and primary page.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&SIMPLE_MATRIX_MAGIC.to_le_bytes())?;
        bincode::serialize_into(writer, &(&self.info, self.sparse_page.as_ref()))?;
        Ok(())
    }

    /// Save to a local file.
    pub fn save_to_local_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        log::info!(
            "saving matrix ({} x {}) to {}",
            self.info.num_row,
            self.info.num_col,
            path.display()
        );
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Load from a local file written by [`save_to_local_file`](Self::save_to_local_file).
    pub fn load_from_local_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("loading matrix from {}", path.display());
        Self::read_from(BufReader::new(File::open(path)?))
    }

    /// The primary page, shared.
    pub fn sparse_page(&self) -> Arc<SparsePage> {
        self.sparse_page.clone()
    }

    /// Number of derived-page constructions performed so far. Repeated
    /// requests for an already-cached page kind do not increase this.
    pub fn derived_page_builds(&self) -> usize {
        self.derived_builds.load(Ordering::Relaxed)
    }

    /// Tear into metadata and primary page, for submission into a
    /// multi-batch coordinator.
    pub(crate) fn into_parts(self) -> (MatrixInfo, Arc<SparsePage>) {
        (self.info, self.sparse_page)
    }

    fn column_page(&self) -> Arc<CscPage> {
        self.column_page
            .get_or_init(|| {
                self.derived_builds.fetch_add(1, Ordering::Relaxed);
                log::debug!("building column-major page");
                Arc::new(self.sparse_page.get_transpose(self.info.num_col))
            })
            .clone()
    }

    fn sorted_column_page(&self) -> Arc<SortedCscPage> {
        self.sorted_column_page
            .get_or_init(|| {
                self.derived_builds.fetch_add(1, Ordering::Relaxed);
                log::debug!("building sorted column-major page");
                Arc::new(
                    self.sparse_page
                        .get_transpose(self.info.num_col)
                        .into_sorted(),
                )
            })
            .clone()
    }

    fn quantized_page(&self, param: &BatchParam) -> Arc<QuantizedPage> {
        let mut cache = self.quantized_page.lock().expect("quantized cache poisoned");
        match cache.as_ref() {
            Some((cached_param, page)) if cached_param == param => page.clone(),
            _ => {
                self.derived_builds.fetch_add(1, Ordering::Relaxed);
                log::debug!("building quantized page with max_bin={}", param.max_bin);
                let page = Arc::new(QuantizedPage::build(
                    &self.sparse_page,
                    self.info.num_col,
                    *param,
                ));
                *cache = Some((*param, page.clone()));
                page
            }
        }
    }
}

impl DMatrix for SimpleDMatrix {
    fn info(&self) -> InfoRef<'_> {
        InfoRef::Borrowed(&self.info)
    }

    fn info_mut(&mut self) -> InfoMut<'_> {
        InfoMut::Borrowed(&mut self.info)
    }

    fn single_col_block(&self) -> bool {
        true
    }

    fn supports(&self, _kind: BatchKind) -> bool {
        // every layout is derivable from the primary page
        true
    }

    fn row_batches(&self) -> Result<BatchSet<SparsePage>> {
        Ok(BatchSet::new(vec![self.sparse_page.clone()]))
    }

    fn column_batches(&self) -> Result<BatchSet<CscPage>> {
        Ok(BatchSet::new(vec![self.column_page()]))
    }

    fn sorted_column_batches(&self) -> Result<BatchSet<SortedCscPage>> {
        Ok(BatchSet::new(vec![self.sorted_column_page()]))
    }

    fn quantized_batches(&self, param: &BatchParam) -> Result<BatchSet<QuantizedPage>> {
        Ok(BatchSet::new(vec![self.quantized_page(param)]))
    }

    fn slice(&self, rows: &[usize]) -> Result<SimpleDMatrix> {
        let page = self.sparse_page.take_rows(rows)?;
        let info = self.info.take_rows(rows, self.info.num_col);
        SimpleDMatrix::from_parts(info, page)
    }

    fn quantized_exists(&self) -> bool {
        self.quantized_page
            .lock()
            .expect("quantized cache poisoned")
            .is_some()
    }

    fn sparse_page_exists(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Entry;
    use ndarray::arr1;

    fn sample_matrix() -> SimpleDMatrix {
        let mut page = SparsePage::new();
        page.push_row(&[Entry::new(0, 1.0), Entry::new(1, 2.0)]);
        page.push_row(&[Entry::new(1, 3.0)]);
        let info = MatrixInfo::new(2, 2, arr1(&[0.0, 1.0])).unwrap();
        SimpleDMatrix::from_parts(info, page).unwrap()
    }

    #[test]
    fn test_from_parts_validates_shape() {
        let mut page = SparsePage::new();
        page.push_row(&[Entry::new(0, 1.0)]);
        let info = MatrixInfo::new(2, 1, arr1(&[0.0, 1.0])).unwrap();
        assert!(SimpleDMatrix::from_parts(info, page).is_err());
    }

    #[test]
    fn test_row_batches_yields_exactly_one_page() {
        let matrix = sample_matrix();
        let mut batches = matrix.row_batches().unwrap();
        let page = batches.next().unwrap();
        assert_eq!(page.num_rows(), 2);
        assert!(batches.next().is_none());
    }

    #[test]
    fn test_stream_round_trip() {
        let matrix = sample_matrix();
        let mut buffer = Vec::new();
        matrix.write_to(&mut buffer).unwrap();

        let restored = SimpleDMatrix::read_from(buffer.as_slice()).unwrap();
        assert_eq!(restored.info.num_row, 2);
        assert_eq!(restored.info.labels, arr1(&[0.0, 1.0]));
        assert_eq!(*restored.sparse_page, *matrix.sparse_page);
    }

    #[test]
    fn test_magic_mismatch_is_format_error() {
        let mut buffer = Vec::new();
        sample_matrix().write_to(&mut buffer).unwrap();
        buffer[0] ^= 0xff;

        let err = SimpleDMatrix::read_from(buffer.as_slice()).unwrap_err();
        assert_eq!(err.category(), "format");
    }

    #[test]
    fn test_derived_pages_cached() {
        let matrix = sample_matrix();
        assert_eq!(matrix.derived_page_builds(), 0);

        let first = matrix.column_batches().unwrap().next().unwrap();
        let second = matrix.column_batches().unwrap().next().unwrap();
        assert_eq!(matrix.derived_page_builds(), 1);
        assert!(Arc::ptr_eq(&first, &second));

        matrix.sorted_column_batches().unwrap();
        assert_eq!(matrix.derived_page_builds(), 2);
    }

    #[test]
    fn test_quantized_cache_keyed_by_param() {
        let matrix = sample_matrix();
        assert!(!matrix.quantized_exists());

        let param = BatchParam { max_bin: 16 };
        matrix.quantized_batches(&param).unwrap();
        matrix.quantized_batches(&param).unwrap();
        assert_eq!(matrix.derived_page_builds(), 1);
        assert!(matrix.quantized_exists());

        // different parameters invalidate and rebuild
        matrix
            .quantized_batches(&BatchParam { max_bin: 8 })
            .unwrap();
        assert_eq!(matrix.derived_page_builds(), 2);
    }

    #[test]
    fn test_slice_preserves_row_content() {
        let matrix = sample_matrix();
        let sliced = matrix.slice(&[1]).unwrap();
        assert_eq!(sliced.info().num_row, 1);
        assert_eq!(sliced.info().labels, arr1(&[1.0]));
        let page = sliced.row_batches().unwrap().next().unwrap();
        assert_eq!(page.row(0), &[Entry::new(1, 3.0)]);
    }

    #[test]
    fn test_slice_empty_and_out_of_bounds() {
        let matrix = sample_matrix();
        let empty = matrix.slice(&[]).unwrap();
        assert_eq!(empty.info().num_row, 0);
        assert_eq!(empty.info().num_col, 2);

        assert!(matches!(
            matrix.slice(&[0, 2]),
            Err(MatrixError::OutOfRange { index: 2, length: 2 })
        ));
    }

    #[test]
    fn test_info_mut_allows_label_overwrite() {
        let mut matrix = sample_matrix();
        matrix.info_mut().labels = arr1(&[5.0, 6.0]);
        assert_eq!(matrix.info().labels, arr1(&[5.0, 6.0]));
    }

    #[test]
    fn test_capability_flags() {
        let matrix = sample_matrix();
        assert!(matrix.single_col_block());
        assert!(matrix.sparse_page_exists());
        assert!(matrix.supports(BatchKind::RowMajor));
        assert!(matrix.supports(BatchKind::Quantized));
    }
}
