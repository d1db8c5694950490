//! CSV persistence for [`DenseMatrix`] (§6 "Persisted state"): delimiter
//! separated, optional header line, ASCII-only, one row per line.

use super::backing::{Backing, F32Backing};
use super::dense::DenseMatrix;
use super::Matrix;
use crate::error::{Error, Result};
use std::io::{Read, Write};

/// Read a dense matrix from CSV. `delimiter` is typically `b','` or
/// `b'\t'`; `has_header` skips the first record.
pub fn read_csv<R: Read>(reader: R, delimiter: u8, has_header: bool) -> Result<DenseMatrix<F32Backing>> {
    let mut builder = csv::ReaderBuilder::new();
    builder.delimiter(delimiter).has_headers(has_header).flexible(false);
    let mut rdr = builder.from_reader(reader);

    let mut rows: Vec<Vec<f32>> = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| Error::invariant(format!("malformed CSV record: {e}")))?;
        let mut row = Vec::with_capacity(record.len());
        for field in record.iter() {
            if !field.is_ascii() {
                return Err(Error::invariant("CSV matrix fields must be ASCII"));
            }
            let value: f32 = field
                .trim()
                .parse()
                .map_err(|_| Error::invariant(format!("non-numeric CSV field: {field:?}")))?;
            row.push(value);
        }
        rows.push(row);
    }

    let rows_n = rows.len();
    let cols_n = rows.first().map(|r| r.len()).unwrap_or(0);
    if rows.iter().any(|r| r.len() != cols_n) {
        return Err(Error::invariant("CSV matrix rows have inconsistent widths"));
    }

    let mut matrix: DenseMatrix<F32Backing> = DenseMatrix::new(rows_n, cols_n);
    for (i, row) in rows.into_iter().enumerate() {
        for (j, value) in row.into_iter().enumerate() {
            matrix.set(i, j, value)?;
        }
    }
    Ok(matrix)
}

/// Write a dense matrix to CSV.
pub fn write_csv<W: Write, B: Backing>(
    writer: W,
    matrix: &DenseMatrix<B>,
    delimiter: u8,
) -> Result<()> {
    let mut builder = csv::WriterBuilder::new();
    builder.delimiter(delimiter);
    let mut wtr = builder.from_writer(writer);
    for row in 0..matrix.rows() {
        let record: Vec<String> = (0..matrix.cols())
            .map(|col| matrix.get(row, col).map(|v| v.to_string()))
            .collect::<Result<_>>()?;
        wtr.write_record(&record)
            .map_err(|e| Error::invariant(format!("CSV write failed: {e}")))?;
    }
    wtr.flush().map_err(Error::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_csv() {
        let mut m: DenseMatrix<F32Backing> = DenseMatrix::new(2, 2);
        m.set(0, 0, 1.0).unwrap();
        m.set(0, 1, 2.0).unwrap();
        m.set(1, 0, 3.0).unwrap();
        m.set(1, 1, 4.0).unwrap();

        let mut buf = Vec::new();
        write_csv(&mut buf, &m, b',').unwrap();

        let parsed = read_csv(buf.as_slice(), b',', false).unwrap();
        assert_eq!(parsed.get(1, 1).unwrap(), 4.0);
        assert_eq!(parsed.get(0, 1).unwrap(), 2.0);
    }

    #[test]
    fn rejects_ragged_rows() {
        let data = "1,2,3\n4,5\n";
        assert!(read_csv(data.as_bytes(), b',', false).is_err());
    }
}
