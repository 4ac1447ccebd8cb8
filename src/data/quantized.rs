//! Quantized (binned) page construction.
//!
//! The quantized page is a binned rendition of the primary sparse page,
//! built from an externally supplied [`BatchParam`]. Full histogram-grade
//! quantization belongs to the downstream training stack; this module
//! carries the storage shape and the build-once-per-param caching contract.

use crate::core::types::{BatchParam, DataSize};
use crate::data::sparse_page::SparsePage;
use serde::{Deserialize, Serialize};

/// Uniform per-feature bin boundaries fitted on the page's value range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FeatureCuts {
    lower: f32,
    width: f32,
}

/// Binned rendition of a sparse page.
///
/// Bin ids are stored per entry, parallel to the source page's row-major
/// entry order, alongside the parameters the page was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedPage {
    /// Parameters this page was built with
    pub param: BatchParam,
    /// Row offsets, mirroring the source page
    pub offset: Vec<u64>,
    /// Bin id per entry, parallel to the source page's entries
    pub bins: Vec<u32>,
    cuts: Vec<FeatureCuts>,
}

impl QuantizedPage {
    /// Bin the given page with uniform per-feature cuts.
    pub fn build(page: &SparsePage, num_col: DataSize, param: BatchParam) -> Self {
        let num_col = num_col as usize;
        let max_bin = param.max_bin.max(1);

        let mut lo = vec![f32::INFINITY; num_col];
        let mut hi = vec![f32::NEG_INFINITY; num_col];
        for entry in &page.data {
            let c = entry.index as usize;
            lo[c] = lo[c].min(entry.fvalue);
            hi[c] = hi[c].max(entry.fvalue);
        }

        let cuts: Vec<FeatureCuts> = (0..num_col)
            .map(|c| {
                if lo[c].is_finite() && hi[c] > lo[c] {
                    FeatureCuts {
                        lower: lo[c],
                        width: (hi[c] - lo[c]) / max_bin as f32,
                    }
                } else {
                    // constant or empty feature collapses into one bin
                    FeatureCuts {
                        lower: if lo[c].is_finite() { lo[c] } else { 0.0 },
                        width: 0.0,
                    }
                }
            })
            .collect();

        let bins = page
            .data
            .iter()
            .map(|entry| {
                let cut = &cuts[entry.index as usize];
                if cut.width == 0.0 {
                    0
                } else {
                    let raw = ((entry.fvalue - cut.lower) / cut.width) as u32;
                    raw.min(max_bin - 1)
                }
            })
            .collect();

        QuantizedPage {
            param,
            offset: page.offset.clone(),
            bins,
            cuts,
        }
    }

    /// Number of rows covered by this page.
    pub fn num_rows(&self) -> usize {
        self.offset.len() - 1
    }

    /// Bin ids of row `r`, parallel to the source row's entries.
    pub fn row(&self, r: usize) -> &[u32] {
        &self.bins[self.offset[r] as usize..self.offset[r + 1] as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Entry;

    #[test]
    fn test_build_bins_within_range() {
        let mut page = SparsePage::new();
        page.push_row(&[Entry::new(0, 0.0), Entry::new(1, 10.0)]);
        page.push_row(&[Entry::new(0, 100.0)]);
        let q = QuantizedPage::build(&page, 2, BatchParam { max_bin: 4 });

        assert_eq!(q.num_rows(), 2);
        assert_eq!(q.offset, page.offset);
        assert!(q.bins.iter().all(|&b| b < 4));
        // min maps to the first bin, max to the last
        assert_eq!(q.row(0)[0], 0);
        assert_eq!(q.row(1)[0], 3);
    }

    #[test]
    fn test_constant_feature_single_bin() {
        let mut page = SparsePage::new();
        page.push_row(&[Entry::new(0, 7.0)]);
        page.push_row(&[Entry::new(0, 7.0)]);
        let q = QuantizedPage::build(&page, 1, BatchParam::default());
        assert!(q.bins.iter().all(|&b| b == 0));
    }
}
