//! Shared-memory Gaussian elimination.
//!
//! Per step, the pivot search and row interchange run sequentially (the max
//! scan is cheap and order-sensitive), then the sub-diagonal row updates are
//! spread over a rayon pool. The pivot row is copied into a per-step stack
//! value and read by every task; no module-level pivot state exists. Each
//! sub-diagonal row is updated by exactly one task with the same arithmetic
//! as the sequential baseline, so results are bit-identical for any thread
//! count.

use crate::error::SolveError;
use crate::sequential::{back_substitute, eliminate_row};
use crate::PIVOT_TOLERANCE;
use ndarray::{s, Array1, Array2, Zip};

/// Solve `A x = b` on a rayon pool of `threads` workers.
pub fn solve(a: &Array2<f64>, b: &Array1<f64>, threads: usize) -> Result<Array1<f64>, SolveError> {
    let n = crate::system::validate(a, b)?;
    if n == 0 || threads == 0 {
        return Err(SolveError::InvalidDimension { n, workers: threads });
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| SolveError::CommunicationFailure(format!("thread pool: {e}")))?;

    let mut a = a.clone();
    let mut b = b.clone();

    pool.install(|| {
        log::debug!("threaded solve: n = {n}, threads = {threads}");

        for k in 0..n - 1 {
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

            // Per-step pivot snapshot; lives only for this iteration.
            let pivot_row = a.row(k).to_owned();
            let pivot_rhs = b[k];

            let mut a_rest = a.slice_mut(s![k + 1.., ..]);
            let b_rest = b.slice_mut(s![k + 1..]);
            Zip::from(a_rest.rows_mut())
                .and(b_rest)
                .par_for_each(|row, rhs| {
                    eliminate_row(row, rhs, pivot_row.view(), pivot_rhs, k);
                });
        }

        if a[[n - 1, n - 1]].abs() < PIVOT_TOLERANCE {
            return Err(SolveError::SingularMatrix);
        }

        Ok(back_substitute(&a, &b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::LinearSystem;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_matches_sequential_bitwise() {
        let sys = LinearSystem::random_dominant(64, 11);
        let reference = crate::sequential::solve(&sys.a, &sys.b).unwrap();
        for threads in [1, 2, 4, 8] {
            let x = solve(&sys.a, &sys.b, threads).unwrap();
            assert_eq!(x, reference, "threads = {threads}");
        }
    }

    #[test]
    fn test_three_by_three_scenario() {
        let a = array![[2.0, 1.0, 1.0], [1.0, 3.0, 1.0], [1.0, 1.0, 4.0]];
        let b = array![8.0, 11.0, 16.0];
        let x = solve(&a, &b, 3).unwrap();
        let expected = [1.875, 2.625, 2.875];
        for i in 0..3 {
            assert_relative_eq!(x[i], expected[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_singular_matrix_is_rejected() {
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        let b = array![2.0, 2.0];
        assert_eq!(solve(&a, &b, 4), Err(SolveError::SingularMatrix));
    }

    #[test]
    fn test_zero_threads_is_invalid() {
        let sys = LinearSystem::well_conditioned(4);
        assert_eq!(
            solve(&sys.a, &sys.b, 0),
            Err(SolveError::InvalidDimension { n: 4, workers: 0 })
        );
    }
}
