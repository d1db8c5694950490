use super::Matrix;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Keyed sparse matrix; absent cells read as `default`.
#[derive(Clone, Debug)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    default: f32,
    cells: HashMap<(usize, usize), f32>,
}

impl SparseMatrix {
    pub fn new(rows: usize, cols: usize, default: f32) -> Self {
        SparseMatrix {
            rows,
            cols,
            default,
            cells: HashMap::new(),
        }
    }

    pub fn nnz(&self) -> usize {
        self.cells.len()
    }
}

impl Matrix for SparseMatrix {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn get(&self, row: usize, col: usize) -> Result<f32> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::invariant(format!(
                "sparse matrix read ({row}, {col}) out of bounds for {}x{}",
                self.rows, self.cols
            )));
        }
        Ok(*self.cells.get(&(row, col)).unwrap_or(&self.default))
    }

    fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::invariant(format!(
                "sparse matrix write ({row}, {col}) out of bounds for {}x{}",
                self.rows, self.cols
            )));
        }
        if value == self.default {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_cell_reads_default() {
        let m = SparseMatrix::new(5, 5, -1.0);
        assert_eq!(m.get(2, 2).unwrap(), -1.0);
    }

    #[test]
    fn set_then_get_round_trips_and_tracks_nnz() {
        let mut m = SparseMatrix::new(5, 5, 0.0);
        m.set(1, 1, 3.0).unwrap();
        assert_eq!(m.get(1, 1).unwrap(), 3.0);
        assert_eq!(m.nnz(), 1);
    }
}
