use super::backing::{Backing, F32Backing};
use super::Matrix;
use crate::error::{Error, Result};

/// Symmetric matrix storing only the upper triangle; `get(i, j) ==
/// get(j, i)`.
#[derive(Clone, Debug)]
pub struct SymmetricMatrix<B: Backing = F32Backing> {
    n: usize,
    cells: B,
}

impl<B: Backing> SymmetricMatrix<B> {
    pub fn new(n: usize) -> Self {
        SymmetricMatrix {
            n,
            cells: B::filled(0.0, Self::upper_len(n), 1.0),
        }
    }

    pub fn with_scale(n: usize, scale: f32) -> Self {
        SymmetricMatrix {
            n,
            cells: B::filled(0.0, Self::upper_len(n), scale),
        }
    }

    fn upper_len(n: usize) -> usize {
        n * (n + 1) / 2
    }

    /// Index into the packed upper triangle for `row <= col`.
    fn upper_index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row <= col);
        // Offset of row `row`'s slice within the packed triangle.
        let triangular = if row == 0 { 0 } else { row * (row - 1) / 2 };
        row * self.n - triangular + (col - row)
    }

    fn ordered(&self, row: usize, col: usize) -> (usize, usize) {
        if row <= col {
            (row, col)
        } else {
            (col, row)
        }
    }
}

impl<B: Backing> Matrix for SymmetricMatrix<B> {
    fn rows(&self) -> usize {
        self.n
    }

    fn cols(&self) -> usize {
        self.n
    }

    fn get(&self, row: usize, col: usize) -> Result<f32> {
        if row >= self.n || col >= self.n {
            return Err(Error::invariant(format!(
                "symmetric matrix read ({row}, {col}) out of bounds for {0}x{0}",
                self.n
            )));
        }
        let (r, c) = self.ordered(row, col);
        Ok(self.cells.get(self.upper_index(r, c)))
    }

    fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        if row >= self.n || col >= self.n {
            return Err(Error::invariant(format!(
                "symmetric matrix write ({row}, {col}) out of bounds for {0}x{0}",
                self.n
            )));
        }
        let (r, c) = self.ordered(row, col);
        let idx = self.upper_index(r, c);
        self.cells.set(idx, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_reads_agree_either_order() {
        let mut m: SymmetricMatrix = SymmetricMatrix::new(4);
        m.set(1, 3, 2.5).unwrap();
        assert_eq!(m.get(1, 3).unwrap(), 2.5);
        assert_eq!(m.get(3, 1).unwrap(), 2.5);
    }

    #[test]
    fn diagonal_is_addressable() {
        let mut m: SymmetricMatrix = SymmetricMatrix::new(3);
        m.set(2, 2, 1.0).unwrap();
        assert_eq!(m.get(2, 2).unwrap(), 1.0);
    }
}
