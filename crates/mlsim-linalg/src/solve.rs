use mlsim_core::{Float, Matrix, MlError, MlResult};

/// Pivot magnitude below which a system is treated as singular.
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-10;

/// Solve `A·x = b` by Gauss-Jordan elimination with partial pivoting.
///
/// Fails with `SingularMatrix` if, after pivoting, a column has no entry of
/// magnitude at least [`DEFAULT_PIVOT_TOLERANCE`].
pub fn solve<T: Float>(a: &Matrix<T>, b: &[T]) -> MlResult<Vec<T>> {
    solve_with_tolerance(a, b, T::from_f64(DEFAULT_PIVOT_TOLERANCE))
}

/// [`solve`] with a caller-chosen pivot tolerance.
pub fn solve_with_tolerance<T: Float>(a: &Matrix<T>, b: &[T], tolerance: T) -> MlResult<Vec<T>> {
    if !a.is_square() {
        return Err(MlError::DimensionMismatch {
            expected: a.rows(),
            got: a.cols(),
        });
    }
    let n = a.rows();
    if b.len() != n {
        return Err(MlError::DimensionMismatch {
            expected: n,
            got: b.len(),
        });
    }

    // Augmented matrix [A | b]
    let mut aug = Matrix::zeros(n, n + 1);
    for r in 0..n {
        for c in 0..n {
            aug.set(r, c, a.get(r, c));
        }
        aug.set(r, n, b[r]);
    }

    for col in 0..n {
        // Largest magnitude entry at or below the diagonal; first row wins ties.
        let mut pivot_row = col;
        for r in (col + 1)..n {
            if aug.get(r, col).abs() > aug.get(pivot_row, col).abs() {
                pivot_row = r;
            }
        }
        let pivot = aug.get(pivot_row, col);
        if pivot.abs() < tolerance || pivot.is_nan() {
            log::debug!("solve: singular at column {} (pivot {})", col, pivot);
            return Err(MlError::SingularMatrix {
                column: col,
                pivot: pivot.to_f64(),
            });
        }
        aug.swap_rows(col, pivot_row);

        // Normalize the pivot row, then clear the column above and below it.
        for c in col..=n {
            aug.set(col, c, aug.get(col, c) / pivot);
        }
        for r in 0..n {
            if r == col {
                continue;
            }
            let factor = aug.get(r, col);
            if factor == T::ZERO {
                continue;
            }
            for c in col..=n {
                aug.set(r, c, aug.get(r, c) - factor * aug.get(col, c));
            }
        }
    }

    Ok((0..n).map(|r| aug.get(r, n)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_solve() {
        // 2x + y = 5
        // x + 3y = 7
        // Solution: x=1.6, y=1.8
        let a: Matrix<f64> = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]]).unwrap();
        let x = solve(&a, &[5.0, 7.0]).unwrap();
        assert_abs_diff_eq!(x[0], 1.6, epsilon = 1e-10);
        assert_abs_diff_eq!(x[1], 1.8, epsilon = 1e-10);
    }

    #[test]
    fn test_identity_returns_rhs() {
        let b = [3.5, -2.0, 0.25, 9.0];
        let x = solve(&Matrix::<f64>::identity(4), &b).unwrap();
        assert_eq!(x, b.to_vec());
    }

    #[test]
    fn test_needs_pivoting() {
        // Zero in the leading position: fails without a row swap.
        let a: Matrix<f64> = Matrix::from_rows(&[
            vec![0.0, 2.0, 1.0],
            vec![1.0, -2.0, -3.0],
            vec![-1.0, 1.0, 2.0],
        ])
        .unwrap();
        let b = [-8.0, 0.0, 3.0];
        let x = solve(&a, &b).unwrap();
        let ax = a.matvec(&x).unwrap();
        for i in 0..3 {
            assert_abs_diff_eq!(ax[i], b[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_singular() {
        let a: Matrix<f64> = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        match solve(&a, &[1.0, 2.0]) {
            Err(MlError::SingularMatrix { column, .. }) => assert_eq!(column, 1),
            other => panic!("expected SingularMatrix, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_checks() {
        let a: Matrix<f64> = Matrix::zeros(2, 3);
        assert!(matches!(solve(&a, &[1.0, 2.0]), Err(MlError::DimensionMismatch { .. })));
        let sq: Matrix<f64> = Matrix::identity(2);
        assert!(matches!(solve(&sq, &[1.0]), Err(MlError::DimensionMismatch { .. })));
    }
}
