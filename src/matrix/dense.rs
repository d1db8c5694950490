use super::backing::{Backing, F32Backing};
use super::Matrix;
use crate::error::{Error, Result};

/// Row-major dense matrix. With `zero_pad` enabled, out-of-range reads
/// return `0.0` instead of erroring and out-of-range writes are silently
/// dropped; with it disabled (the default), both raise
/// [`Error::Invariant`].
#[derive(Clone, Debug)]
pub struct DenseMatrix<B: Backing = F32Backing> {
    rows: usize,
    cols: usize,
    cells: B,
    zero_pad: bool,
}

impl<B: Backing> DenseMatrix<B> {
    pub fn new(rows: usize, cols: usize) -> Self {
        DenseMatrix {
            rows,
            cols,
            cells: B::filled(0.0, rows * cols, 1.0),
            zero_pad: false,
        }
    }

    pub fn with_scale(rows: usize, cols: usize, scale: f32) -> Self {
        DenseMatrix {
            rows,
            cols,
            cells: B::filled(0.0, rows * cols, scale),
            zero_pad: false,
        }
    }

    pub fn with_zero_padding(mut self, zero_pad: bool) -> Self {
        self.zero_pad = zero_pad;
        self
    }

    fn in_range(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }
}

impl<B: Backing> Matrix for DenseMatrix<B> {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn get(&self, row: usize, col: usize) -> Result<f32> {
        if !self.in_range(row, col) {
            return if self.zero_pad {
                Ok(0.0)
            } else {
                Err(Error::invariant(format!(
                    "dense matrix read ({row}, {col}) out of bounds for {}x{}",
                    self.rows, self.cols
                )))
            };
        }
        Ok(self.cells.get(row * self.cols + col))
    }

    fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        if !self.in_range(row, col) {
            return if self.zero_pad {
                Ok(())
            } else {
                Err(Error::invariant(format!(
                    "dense matrix write ({row}, {col}) out of bounds for {}x{}",
                    self.rows, self.cols
                )))
            };
        }
        self.cells.set(row * self.cols + col, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_errors_without_padding() {
        let m: DenseMatrix = DenseMatrix::new(2, 2);
        assert!(m.get(5, 0).is_err());
    }

    #[test]
    fn out_of_range_is_zero_with_padding() {
        let m: DenseMatrix = DenseMatrix::new(2, 2).with_zero_padding(true);
        assert_eq!(m.get(5, 0).unwrap(), 0.0);
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut m: DenseMatrix = DenseMatrix::new(3, 3);
        m.set(1, 2, 4.5).unwrap();
        assert_eq!(m.get(1, 2).unwrap(), 4.5);
    }
}
