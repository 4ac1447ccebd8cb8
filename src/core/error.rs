//! Error handling and error types for the data matrix engine.
//!
//! This module provides the crate-wide error enum and `Result` alias,
//! ensuring clear error propagation throughout ingestion, storage, and
//! batch coordination.

use std::io;
use thiserror::Error;

/// Main error type for the data matrix engine.
///
/// Covers every failure mode of adapter conversion, matrix construction,
/// stream round-trips, and batch access.
#[derive(Error, Debug)]
pub enum MatrixError {
    /// Source configuration errors (absent label column, mismatched batch
    /// shapes). These fail the whole build and are not recoverable locally.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialized-stream format errors, including magic-marker mismatch.
    /// The stream is left unusable.
    #[error("Format error: {message}")]
    Format { message: String },

    /// An operation the receiving matrix kind does not provide, such as
    /// column-major access on a multi-batch coordinator. Signals a
    /// caller/design mismatch rather than a data problem.
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    /// Index outside the valid range of rows or columns.
    #[error("Index out of range: index {index}, length {length}")]
    OutOfRange { index: usize, length: usize },

    /// File I/O errors from the local save/load path.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Bincode payload errors from the stream construction path.
    #[error("Bincode error: {source}")]
    Bincode {
        #[from]
        source: bincode::Error,
    },
}

/// Type alias for Results using MatrixError
pub type Result<T> = std::result::Result<T, MatrixError>;

impl MatrixError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        MatrixError::Config {
            message: message.into(),
        }
    }

    /// Create a format error
    pub fn format<S: Into<String>>(message: S) -> Self {
        MatrixError::Format {
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error
    pub fn unsupported<S: Into<String>>(operation: S) -> Self {
        MatrixError::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    /// Create an out-of-range error
    pub fn out_of_range(index: usize, length: usize) -> Self {
        MatrixError::OutOfRange { index, length }
    }

    /// Check if this error is recoverable by the caller
    pub fn is_recoverable(&self) -> bool {
        match self {
            MatrixError::Config { .. } => false,
            MatrixError::Format { .. } => false,
            MatrixError::UnsupportedOperation { .. } => false,
            MatrixError::OutOfRange { .. } => false,
            MatrixError::Io { .. } => true,
            MatrixError::Bincode { .. } => false,
        }
    }

    /// Get error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            MatrixError::Config { .. } => "config",
            MatrixError::Format { .. } => "format",
            MatrixError::UnsupportedOperation { .. } => "unsupported_operation",
            MatrixError::OutOfRange { .. } => "out_of_range",
            MatrixError::Io { .. } => "io",
            MatrixError::Bincode { .. } => "bincode",
        }
    }
}
