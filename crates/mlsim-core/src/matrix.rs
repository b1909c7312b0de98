use serde::{Deserialize, Serialize};

use crate::dtype::Float;
use crate::error::{MlError, MlResult};

/// Small dense matrix, row-major, used for design matrices and normal equations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Matrix<T: Float> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl<T: Float> Matrix<T> {
    pub fn new(data: Vec<T>, rows: usize, cols: usize) -> MlResult<Self> {
        if data.len() != rows * cols {
            return Err(MlError::DimensionMismatch {
                expected: rows * cols,
                got: data.len(),
            });
        }
        Ok(Matrix { data, rows, cols })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![T::ZERO; rows * cols],
            rows,
            cols,
        }
    }

    /// Identity matrix of size n×n.
    pub fn identity(n: usize) -> Self {
        let mut m = Matrix::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = T::ONE;
        }
        m
    }

    /// Build from row vectors; every row must have the same length.
    pub fn from_rows(rows: &[Vec<T>]) -> MlResult<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(MlError::DimensionMismatch {
                    expected: cols,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Matrix {
            data,
            rows: rows.len(),
            cols,
        })
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> T {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: T) {
        self.data[r * self.cols + c] = value;
    }

    pub fn row(&self, r: usize) -> &[T] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    // ─── Products ───────────────────────────────────────────────────────────

    pub fn transpose(&self) -> Self {
        let mut t = Matrix::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                t.data[c * self.rows + r] = self.get(r, c);
            }
        }
        t
    }

    pub fn matmul(&self, other: &Matrix<T>) -> MlResult<Self> {
        if self.cols != other.rows {
            return Err(MlError::DimensionMismatch {
                expected: self.cols,
                got: other.rows,
            });
        }
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                for j in 0..other.cols {
                    out.data[i * other.cols + j] += a * other.get(k, j);
                }
            }
        }
        Ok(out)
    }

    pub fn matvec(&self, v: &[T]) -> MlResult<Vec<T>> {
        if self.cols != v.len() {
            return Err(MlError::DimensionMismatch {
                expected: self.cols,
                got: v.len(),
            });
        }
        Ok((0..self.rows)
            .map(|r| self.row(r).iter().zip(v).map(|(&a, &b)| a * b).sum())
            .collect())
    }

    /// `self + diag(values)` for a square matrix with one value per row.
    pub fn add_diagonal(&self, values: &[T]) -> MlResult<Self> {
        if !self.is_square() || values.len() != self.rows {
            return Err(MlError::DimensionMismatch {
                expected: self.rows,
                got: values.len(),
            });
        }
        let mut out = self.clone();
        for (i, &v) in values.iter().enumerate() {
            out.data[i * self.cols + i] += v;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul_and_transpose() {
        let rows = [vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let a: Matrix<f64> = Matrix::from_rows(&rows).unwrap();
        let ata = a.transpose().matmul(&a).unwrap();
        assert_eq!(ata, Matrix::from_rows(&[vec![35.0, 44.0], vec![44.0, 56.0]]).unwrap());
        assert_eq!(a.matvec(&[1.0, -1.0]).unwrap(), vec![-1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_shape_errors() {
        let a: Matrix<f64> = Matrix::zeros(2, 3);
        assert!(a.matmul(&Matrix::zeros(2, 2)).is_err());
        assert!(Matrix::<f64>::new(vec![1.0; 5], 2, 3).is_err());
        assert!(Matrix::<f64>::from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_add_diagonal() {
        let m = Matrix::<f64>::identity(2).add_diagonal(&[2.0, 0.0]).unwrap();
        assert_eq!(m.get(0, 0), 3.0);
        assert_eq!(m.get(1, 1), 1.0);
        assert_eq!(m.get(0, 1), 0.0);
        assert!(Matrix::<f64>::identity(2).add_diagonal(&[1.0]).is_err());
    }
}
