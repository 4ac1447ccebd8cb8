//! Core infrastructure for the data matrix engine.
//!
//! Foundational components shared by the whole crate:
//!
//! - [`types`]: fundamental aliases, the sparse [`Entry`](types::Entry),
//!   and the closed [`BatchKind`](types::BatchKind) set
//! - [`error`]: the crate-wide error enum and `Result` alias
//! - [`meta`]: shared matrix metadata (counts, labels, weights)

pub mod error;
pub mod meta;
pub mod types;

pub use error::{MatrixError, Result};
pub use meta::MatrixInfo;
pub use types::*;
