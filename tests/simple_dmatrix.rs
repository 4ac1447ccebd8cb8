//! Single-batch matrix integration tests.

use approx::assert_abs_diff_eq;
use dmatrix_rust::*;
use tempfile::TempDir;

fn sample_matrix() -> SimpleDMatrix {
    let batch = ColumnBatch::new(vec![
        Column::dense(vec![1.0, f32::NAN, 7.5]),
        Column::dense(vec![2.0, 3.0, f32::NAN]),
        Column::dense(vec![0.25, 1.0, 0.5]),
    ])
    .unwrap();
    let source = ColumnarSource::new(
        vec!["f0".to_string(), "f1".to_string(), "y".to_string()],
        vec![batch],
    )
    .unwrap();
    let adapter = ColumnarAdapter::new(source, "y").unwrap();
    SimpleDMatrix::from_adapter(&adapter, f32::NAN, 1).unwrap()
}

#[test]
fn test_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("matrix.bin");

    let matrix = sample_matrix();
    matrix.save_to_local_file(&path).unwrap();
    let restored = SimpleDMatrix::load_from_local_file(&path).unwrap();

    assert_eq!(restored.info().num_row, 3);
    assert_eq!(restored.info().num_col, 2);
    let original = matrix.row_batches().unwrap().next().unwrap();
    let roundtrip = restored.row_batches().unwrap().next().unwrap();
    assert_eq!(original.offset, roundtrip.offset);
    assert_eq!(original.data, roundtrip.data);
    for (a, b) in matrix
        .info()
        .labels
        .iter()
        .zip(restored.info().labels.iter())
    {
        assert_abs_diff_eq!(*a, *b);
    }
}

#[test]
fn test_truncated_and_foreign_streams_rejected() {
    let err = SimpleDMatrix::read_from(&b"\x01\x02"[..]).unwrap_err();
    assert_eq!(err.category(), "io");

    let err = SimpleDMatrix::read_from(&b"NOTAMATRIXSTREAM"[..]).unwrap_err();
    assert_eq!(err.category(), "format");
}

#[test]
fn test_derived_page_idempotence() {
    let matrix = sample_matrix();
    assert_eq!(matrix.derived_page_builds(), 0);

    for _ in 0..3 {
        matrix.column_batches().unwrap();
        matrix.sorted_column_batches().unwrap();
    }
    assert_eq!(matrix.derived_page_builds(), 2);
}

#[test]
fn test_column_page_contents() {
    let matrix = sample_matrix();
    let csc = matrix.column_batches().unwrap().next().unwrap();
    assert_eq!(csc.num_cols(), 2);
    // f0 present in rows 0 and 2
    assert_eq!(csc.col(0), &[Entry::new(0, 1.0), Entry::new(2, 7.5)]);
    // f1 present in rows 0 and 1
    assert_eq!(csc.col(1), &[Entry::new(0, 2.0), Entry::new(1, 3.0)]);

    let sorted = matrix.sorted_column_batches().unwrap().next().unwrap();
    let values: Vec<f32> = sorted.col(0).iter().map(|e| e.fvalue).collect();
    assert_eq!(values, vec![1.0, 7.5]);
}

#[test]
fn test_slice_empty_keeps_column_count() {
    let matrix = sample_matrix();
    let empty = matrix.slice(&[]).unwrap();
    assert_eq!(empty.info().num_row, 0);
    assert_eq!(empty.info().num_col, matrix.info().num_col);
    assert_eq!(empty.row_batches().unwrap().next().unwrap().num_rows(), 0);
}

#[test]
fn test_slice_reorders_rows() {
    let matrix = sample_matrix();
    let sliced = matrix.slice(&[2, 0]).unwrap();
    assert_eq!(sliced.info().labels.to_vec(), vec![0.5, 0.25]);

    let page = sliced.row_batches().unwrap().next().unwrap();
    assert_eq!(page.row(0), &[Entry::new(0, 7.5)]);
    assert_eq!(page.row(1), &[Entry::new(0, 1.0), Entry::new(1, 2.0)]);
}

#[test]
fn test_slice_out_of_bounds() {
    let matrix = sample_matrix();
    let err = matrix.slice(&[0, 5]).unwrap_err();
    assert_eq!(err.category(), "out_of_range");
}

#[test]
fn test_quantized_rebuild_on_param_change() {
    let matrix = sample_matrix();
    let coarse = matrix
        .quantized_batches(&BatchParam { max_bin: 2 })
        .unwrap()
        .next()
        .unwrap();
    assert!(coarse.bins.iter().all(|&b| b < 2));
    assert_eq!(matrix.derived_page_builds(), 1);

    let fine = matrix
        .quantized_batches(&BatchParam { max_bin: 64 })
        .unwrap()
        .next()
        .unwrap();
    assert_eq!(fine.param.max_bin, 64);
    assert_eq!(matrix.derived_page_builds(), 2);
}
