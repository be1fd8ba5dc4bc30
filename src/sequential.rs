//! Sequential Gaussian elimination baseline.
//!
//! Forward elimination with partial pivoting followed by back-substitution.
//! The parallel variants reuse [`eliminate_row`] and [`back_substitute`] so
//! all variants apply bit-identical arithmetic to each row.

use crate::error::SolveError;
use crate::PIVOT_TOLERANCE;
use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1};

/// Solve `A x = b` on a single thread.
///
/// The caller's matrix and right-hand side are copied; the originals stay
/// untouched for residual verification.
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, SolveError> {
    let n = crate::system::validate(a, b)?;
    if n == 0 {
        return Err(SolveError::InvalidDimension { n: 0, workers: 1 });
    }

    let mut a = a.clone();
    let mut b = b.clone();

    for k in 0..n - 1 {
        // Largest-magnitude candidate in column k at or below the diagonal;
        // strict comparison keeps the lowest row index on ties.
        let mut max_row = k;
        let mut max_val = a[[k, k]].abs();
        for i in k + 1..n {
            let val = a[[i, k]].abs();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if max_val < PIVOT_TOLERANCE {
            return Err(SolveError::SingularMatrix);
        }

        if max_row != k {
            for j in 0..n {
                a.swap([k, j], [max_row, j]);
            }
            b.swap(k, max_row);
        }

        let pivot_row = a.row(k).to_owned();
        let pivot_rhs = b[k];
        for i in k + 1..n {
            let rhs = &mut b[i];
            eliminate_row(a.row_mut(i), rhs, pivot_row.view(), pivot_rhs, k);
        }
    }

    if a[[n - 1, n - 1]].abs() < PIVOT_TOLERANCE {
        return Err(SolveError::SingularMatrix);
    }

    Ok(back_substitute(&a, &b))
}

/// Subtract `factor` times the pivot row from one sub-diagonal row,
/// restricted to columns >= k, and update its b entry.
///
/// `factor = row[k] / pivot[k]`; the caller guarantees the pivot entry is
/// above the pivot tolerance.
pub(crate) fn eliminate_row(
    mut row: ArrayViewMut1<f64>,
    rhs: &mut f64,
    pivot: ArrayView1<f64>,
    pivot_rhs: f64,
    k: usize,
) {
    let factor = row[k] / pivot[k];
    for j in k..row.len() {
        row[j] -= factor * pivot[j];
    }
    *rhs -= factor * pivot_rhs;
}

/// Resolve an upper-triangular system from the last unknown to the first.
///
/// The caller guarantees every diagonal entry is above the pivot tolerance;
/// forward elimination has already rejected singular systems.
pub(crate) fn back_substitute(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut value = b[i];
        for j in i + 1..n {
            value -= a[[i, j]] * x[j];
        }
        x[i] = value / a[[i, i]];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::LinearSystem;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1, Array2};

    #[test]
    fn test_solves_three_by_three() {
        let a = array![[2.0, 1.0, 1.0], [1.0, 3.0, 1.0], [1.0, 1.0, 4.0]];
        let b = array![8.0, 11.0, 16.0];
        let x = solve(&a, &b).unwrap();
        let expected = [1.875, 2.625, 2.875];
        for i in 0..3 {
            assert_relative_eq!(x[i], expected[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_recovers_reference_solution() {
        let sys = LinearSystem::well_conditioned(50);
        let x = solve(&sys.a, &sys.b).unwrap();
        let expected = LinearSystem::reference_solution(50);
        for i in 0..50 {
            assert_relative_eq!(x[i], expected[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_pivoting_handles_zero_diagonal() {
        // A starts with a zero pivot; row interchange is required.
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let b = array![2.0, 3.0];
        let x = solve(&a, &b).unwrap();
        assert_relative_eq!(x[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_row_is_singular() {
        let a = array![[1.0, 2.0, 3.0], [0.0, 0.0, 0.0], [4.0, 5.0, 6.0]];
        let b = array![1.0, 0.0, 2.0];
        assert_eq!(solve(&a, &b), Err(SolveError::SingularMatrix));
    }

    #[test]
    fn test_dependent_rows_are_singular() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert_eq!(solve(&a, &b), Err(SolveError::SingularMatrix));
    }

    #[test]
    fn test_one_by_one_system() {
        let a = array![[4.0]];
        let b = array![8.0];
        assert_eq!(solve(&a, &b).unwrap(), array![2.0]);
    }

    #[test]
    fn test_empty_system_is_invalid() {
        let a = Array2::<f64>::zeros((0, 0));
        let b = Array1::<f64>::zeros(0);
        assert_eq!(
            solve(&a, &b),
            Err(SolveError::InvalidDimension { n: 0, workers: 1 })
        );
    }
}
