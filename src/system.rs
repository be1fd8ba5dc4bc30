//! Dense linear systems and test-matrix generators.

use crate::error::SolveError;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// A dense n-by-n system `A x = b`.
///
/// The solvers never mutate the caller's system; each variant works on its
/// own copy so the original stays available for residual verification.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    /// Coefficient matrix.
    pub a: Array2<f64>,
    /// Right-hand side.
    pub b: Array1<f64>,
    /// System dimension.
    pub n: usize,
}

impl LinearSystem {
    /// Wrap an existing matrix and right-hand side, checking shapes.
    pub fn new(a: Array2<f64>, b: Array1<f64>) -> Result<Self, SolveError> {
        let n = validate(&a, &b)?;
        Ok(LinearSystem { a, b, n })
    }

    /// Deterministic diagonally dominant system with known solution
    /// `x*[i] = i + 1`.
    ///
    /// `A[i][i] = n + 10`, `A[i][j] = 1 / (i + j + 1)` off the diagonal,
    /// and `b = A x*`.
    pub fn well_conditioned(n: usize) -> Self {
        let a = Array2::from_shape_fn((n, n), |(i, j)| {
            if i == j {
                n as f64 + 10.0
            } else {
                1.0 / (i + j + 1) as f64
            }
        });
        let b = a.dot(&Self::reference_solution(n));
        LinearSystem { a, b, n }
    }

    /// Seeded random diagonally dominant system, reproducible per seed.
    ///
    /// Off-diagonal entries are drawn from [-1, 1) and the diagonal is lifted
    /// by `n` so dominance holds for every size. The right-hand side is
    /// `b = A x*` with `x*[i] = i + 1`.
    pub fn random_dominant(n: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let a = Array2::from_shape_fn((n, n), |(i, j)| {
            if i == j {
                n as f64 + rng.gen_range(10.0..20.0)
            } else {
                rng.gen_range(-1.0..1.0)
            }
        });
        let b = a.dot(&Self::reference_solution(n));
        LinearSystem { a, b, n }
    }

    /// The solution both generators are built around: `x*[i] = i + 1`.
    pub fn reference_solution(n: usize) -> Array1<f64> {
        Array1::from_iter((1..=n).map(|i| i as f64))
    }
}

impl fmt::Display for LinearSystem {
    /// Render small systems; anything above 10 rows prints a summary only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.n > 10 {
            return write!(f, "LinearSystem {{ n: {} }}", self.n);
        }
        for i in 0..self.n {
            for j in 0..self.n {
                write!(f, "{:8.2} ", self.a[[i, j]])?;
            }
            writeln!(f, "| {:8.2}", self.b[i])?;
        }
        Ok(())
    }
}

/// Check that `a` is square and `b` matches it; returns the dimension.
pub(crate) fn validate(a: &Array2<f64>, b: &Array1<f64>) -> Result<usize, SolveError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(SolveError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }
    if b.len() != n {
        return Err(SolveError::DimensionMismatch {
            expected: n,
            got: b.len(),
        });
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_well_conditioned_rhs_matches_reference() {
        let sys = LinearSystem::well_conditioned(6);
        let expected = sys.a.dot(&LinearSystem::reference_solution(6));
        for i in 0..6 {
            assert_relative_eq!(sys.b[i], expected[i], epsilon = 1e-14);
        }
    }

    #[test]
    fn test_random_dominant_is_reproducible() {
        let first = LinearSystem::random_dominant(20, 42);
        let second = LinearSystem::random_dominant(20, 42);
        assert_eq!(first, second);

        let other_seed = LinearSystem::random_dominant(20, 43);
        assert_ne!(first, other_seed);
    }

    #[test]
    fn test_random_dominant_diagonal_dominates() {
        let sys = LinearSystem::random_dominant(40, 7);
        for i in 0..40 {
            let off_sum: f64 = (0..40)
                .filter(|&j| j != i)
                .map(|j| sys.a[[i, j]].abs())
                .sum();
            assert!(sys.a[[i, i]].abs() > off_sum);
        }
    }

    #[test]
    fn test_new_rejects_shape_mismatch() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![1.0, 2.0, 3.0];
        assert_eq!(
            LinearSystem::new(a, b),
            Err(SolveError::DimensionMismatch { expected: 2, got: 3 })
        );
    }
}
