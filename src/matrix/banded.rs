use super::backing::{Backing, F32Backing};
use super::Matrix;
use crate::error::{Error, Result};

/// Symmetric matrix storing only the diagonals within `[-bandwidth/2,
/// +bandwidth/2]`. Writes outside the band are silently ignored; reads
/// outside the band yield `default_fill` rather than erroring. This is
/// what keeps long self-similarity matrices within memory budget: with a
/// bandwidth of `w`, storage is `O(n * w)` instead of `O(n^2)`.
#[derive(Clone, Debug)]
pub struct SymmetricBandedMatrix<B: Backing = F32Backing> {
    n: usize,
    half_band: usize,
    default_fill: f32,
    // `diagonals[d]` holds the `n - d` entries of offset `d`, for
    // `d` in `0..=half_band`.
    diagonals: Vec<B>,
}

impl<B: Backing> SymmetricBandedMatrix<B> {
    /// `bandwidth` must be odd (an even bandwidth cannot be split evenly
    /// around the diagonal); `bandwidth / 2` entries are kept on each
    /// side.
    pub fn new(n: usize, bandwidth: usize, default_fill: f32) -> Result<Self> {
        if bandwidth % 2 == 0 {
            return Err(Error::configuration(format!(
                "symmetric banded matrix requires odd bandwidth, got {bandwidth}"
            )));
        }
        let half_band = bandwidth / 2;
        let diagonals = (0..=half_band)
            .map(|d| B::filled(default_fill, n.saturating_sub(d), 1.0))
            .collect();
        Ok(SymmetricBandedMatrix {
            n,
            half_band,
            default_fill,
            diagonals,
        })
    }

    pub fn bandwidth(&self) -> usize {
        2 * self.half_band + 1
    }

    fn ordered(&self, row: usize, col: usize) -> (usize, usize) {
        if row <= col {
            (row, col)
        } else {
            (col, row)
        }
    }
}

impl<B: Backing> Matrix for SymmetricBandedMatrix<B> {
    fn rows(&self) -> usize {
        self.n
    }

    fn cols(&self) -> usize {
        self.n
    }

    fn get(&self, row: usize, col: usize) -> Result<f32> {
        if row >= self.n || col >= self.n {
            return Err(Error::invariant(format!(
                "banded matrix read ({row}, {col}) out of bounds for {0}x{0}",
                self.n
            )));
        }
        let (r, c) = self.ordered(row, col);
        let d = c - r;
        if d > self.half_band {
            return Ok(self.default_fill);
        }
        Ok(self.diagonals[d].get(r))
    }

    fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        if row >= self.n || col >= self.n {
            return Err(Error::invariant(format!(
                "banded matrix write ({row}, {col}) out of bounds for {0}x{0}",
                self.n
            )));
        }
        let (r, c) = self.ordered(row, col);
        let d = c - r;
        if d > self.half_band {
            // Outside the band: silently ignored, per contract.
            return Ok(());
        }
        self.diagonals[d].set(r, value);
        Ok(())
    }
}
