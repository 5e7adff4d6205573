//! Persistence of projection matrices.
//!
//! Two layouts are supported:
//!
//! - **binary**: `rows × cols` IEEE-754 `f64` values in little-endian byte
//!   order, row-major, with no header. The reader must know the shape.
//! - **CSV**: one line per row, every value followed by a comma.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use nalgebra::DMatrix;
use secantopt_core::types::Scalar;

use crate::error::{SecantError, SecantResult};

/// Writes `matrix` as raw row-major little-endian `f64` values.
pub fn write_binary<T: Scalar, W: Write>(matrix: &DMatrix<T>, mut writer: W) -> SecantResult<()> {
    for i in 0..matrix.nrows() {
        for j in 0..matrix.ncols() {
            writer.write_all(&Scalar::to_f64(matrix[(i, j)]).to_le_bytes())?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Reads a `rows × cols` matrix written by [`write_binary`].
///
/// # Errors
///
/// `InvalidParameter` for a zero shape, `Io` with `UnexpectedEof` for a
/// short input and `Io` with `InvalidData` if bytes remain after the matrix.
pub fn read_binary<T: Scalar, R: Read>(mut reader: R, rows: usize, cols: usize) -> SecantResult<DMatrix<T>> {
    if rows == 0 || cols == 0 {
        return Err(SecantError::invalid_parameter(format!(
            "cannot read a {} × {} matrix",
            rows, cols
        )));
    }

    let mut matrix = DMatrix::zeros(rows, cols);
    let mut bytes = [0u8; 8];
    for i in 0..rows {
        for j in 0..cols {
            reader.read_exact(&mut bytes)?;
            matrix[(i, j)] = <T as Scalar>::from_f64(f64::from_le_bytes(bytes));
        }
    }

    let mut probe = [0u8; 1];
    if reader.read(&mut probe)? != 0 {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            format!("trailing data after {} × {} matrix", rows, cols),
        )
        .into());
    }
    Ok(matrix)
}

/// Writes `matrix` as CSV, one row per line, each value followed by a comma.
pub fn write_csv<T: Scalar, W: Write>(matrix: &DMatrix<T>, mut writer: W) -> SecantResult<()> {
    for row in matrix.row_iter() {
        for value in row.iter() {
            write!(writer, "{},", Scalar::to_f64(*value))?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a matrix written by [`write_csv`].
///
/// Blank lines are ignored and the trailing comma is optional.
pub fn read_csv<T: Scalar, R: BufRead>(reader: R) -> SecantResult<DMatrix<T>> {
    let mut values = Vec::new();
    let mut cols: Option<usize> = None;
    let mut rows = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields = line.strip_suffix(',').unwrap_or(line);
        let mut count = 0;
        for field in fields.split(',') {
            let field = field.trim();
            let value: f64 = field
                .parse()
                .map_err(|_| SecantError::parse(index + 1, format!("not a number: '{}'", field)))?;
            values.push(<T as Scalar>::from_f64(value));
            count += 1;
        }
        match cols {
            None => cols = Some(count),
            Some(expected) if expected != count => {
                return Err(SecantError::dimension_mismatch(
                    format!("{} values per row", expected),
                    format!("{} on line {}", count, index + 1),
                ))
            }
            Some(_) => {}
        }
        rows += 1;
    }

    let cols = cols.ok_or_else(|| SecantError::parse(0, "no rows"))?;
    Ok(DMatrix::from_row_slice(rows, cols, &values))
}

/// Writes `matrix` to a binary file.
pub fn save_binary<T: Scalar, P: AsRef<Path>>(matrix: &DMatrix<T>, path: P) -> SecantResult<()> {
    write_binary(matrix, BufWriter::new(File::create(path)?))
}

/// Reads a `rows × cols` matrix from a binary file.
pub fn load_binary<T: Scalar, P: AsRef<Path>>(path: P, rows: usize, cols: usize) -> SecantResult<DMatrix<T>> {
    read_binary(BufReader::new(File::open(path)?), rows, cols)
}

/// Writes `matrix` to a CSV file.
pub fn save_csv<T: Scalar, P: AsRef<Path>>(matrix: &DMatrix<T>, path: P) -> SecantResult<()> {
    write_csv(matrix, BufWriter::new(File::create(path)?))
}

/// Reads a matrix from a CSV file.
pub fn load_csv<T: Scalar, P: AsRef<Path>>(path: P) -> SecantResult<DMatrix<T>> {
    read_csv(BufReader::new(File::open(path)?))
}
