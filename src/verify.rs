//! Independent residual verification.
//!
//! The residual is always computed against the caller's ORIGINAL matrix and
//! right-hand side, never the triangularized working copy; the solvers leave
//! the caller's system untouched exactly so this check stays meaningful.

use ndarray::{Array1, Array2};

/// `max_i |sum_j A[i][j] x[j] - b[i]|` over the original system.
pub fn max_residual(a: &Array2<f64>, x: &Array1<f64>, b: &Array1<f64>) -> f64 {
    let ax = a.dot(x);
    ax.iter()
        .zip(b.iter())
        .map(|(lhs, rhs)| (lhs - rhs).abs())
        .fold(0.0, f64::max)
}

/// Accepted residual bound for an n-row system.
///
/// 1e-9 up to n = 2000, relaxed to 1e-6 beyond that to reflect expected
/// floating-point accumulation growth. This scaling rule is part of the
/// contract, not a tuning knob.
pub fn tolerance_for(n: usize) -> f64 {
    if n <= 2000 {
        1e-9
    } else {
        1e-6
    }
}

/// Whether `x` solves the original system within the size-dependent bound.
pub fn verify(a: &Array2<f64>, x: &Array1<f64>, b: &Array1<f64>) -> bool {
    max_residual(a, x, b) <= tolerance_for(b.len())
}
