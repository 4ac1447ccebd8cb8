//! Core data types for the data matrix engine.
//!
//! This module defines the fundamental aliases and enumerations shared by
//! the adapter, the storage pages, and the matrix implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data indexing type for row counts and row ids.
/// 32-bit integer supporting up to 2 billion data points.
pub type DataSize = i32;

/// Target value and sample weight type.
pub type Label = f32;

/// Feature index type for identifying features after the label split.
pub type FeatureIndex = u32;

/// One non-missing cell of the sparse representation: the remapped feature
/// index and the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Remapped 0-based feature index
    pub index: FeatureIndex,
    /// Feature value
    pub fvalue: f32,
}

impl Entry {
    /// Create a new entry
    pub fn new(index: FeatureIndex, fvalue: f32) -> Self {
        Entry { index, fvalue }
    }
}

/// The closed set of page layouts a matrix can expose.
///
/// Every matrix implementation declares which of these it can currently
/// produce through [`DMatrix::supports`](crate::data::DMatrix::supports);
/// there is no open-ended page subclassing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchKind {
    /// Row-major sparse page, the primary storage layout
    RowMajor,
    /// Column-major transpose of the primary page
    ColumnMajor,
    /// Column-major page with each column sorted by value
    SortedColumn,
    /// Quantized/binned page built from an external binning parameter
    Quantized,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchKind::RowMajor => write!(f, "row_major"),
            BatchKind::ColumnMajor => write!(f, "column_major"),
            BatchKind::SortedColumn => write!(f, "sorted_column"),
            BatchKind::Quantized => write!(f, "quantized"),
        }
    }
}

/// Parameters keying the construction of a quantized page.
///
/// A quantized page is cached together with the parameters used to request
/// it; requesting with different parameters rebuilds the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchParam {
    /// Maximum number of bins per feature
    pub max_bin: u32,
}

impl Default for BatchParam {
    fn default() -> Self {
        BatchParam { max_bin: 256 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_sizes() {
        assert_eq!(std::mem::size_of::<DataSize>(), 4);
        assert_eq!(std::mem::size_of::<Label>(), 4);
        assert_eq!(std::mem::size_of::<Entry>(), 8);
    }

    #[test]
    fn test_batch_kind_display() {
        assert_eq!(BatchKind::RowMajor.to_string(), "row_major");
        assert_eq!(BatchKind::ColumnMajor.to_string(), "column_major");
        assert_eq!(BatchKind::SortedColumn.to_string(), "sorted_column");
        assert_eq!(BatchKind::Quantized.to_string(), "quantized");
    }

    #[test]
    fn test_batch_param_default() {
        assert_eq!(BatchParam::default(), BatchParam { max_bin: 256 });
    }

    #[test]
    fn test_entry_serialization() {
        let entry = Entry::new(3, 1.5);
        let bytes = bincode::serialize(&entry).unwrap();
        let restored: Entry = bincode::deserialize(&bytes).unwrap();
        assert_eq!(entry, restored);
    }
}
