//! Matrix storage. A single [`Matrix`] trait plus four implementations
//! (dense, symmetric, symmetric-banded, sparse), each over a pluggable
//! [`backing::Backing`], so self-similarity matrices over long sequences
//! can trade precision for an order-of-magnitude memory saving without
//! changing the call sites that read and write them.

pub mod backing;
pub mod banded;
pub mod csv_io;
pub mod dense;
pub mod sparse;
pub mod symmetric;

pub use backing::{Backing, F32Backing, I32Backing, I8Backing, U8Backing};
pub use banded::SymmetricBandedMatrix;
pub use dense::DenseMatrix;
pub use sparse::SparseMatrix;
pub use symmetric::SymmetricMatrix;

use crate::error::Result;

/// Common interface over the four matrix shapes. `get`/`set` are
/// fallible: dense storage raises on out-of-bounds access (unless
/// configured with zero-padding), while banded storage never raises —
/// reads outside the band yield a default and writes outside it are
/// dropped.
pub trait Matrix: std::fmt::Debug {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> Result<f32>;
    fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()>;
}
