// src/diagnostics.rs

use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;

// --- Utility Functions for Metrics ---

/// Computes the Frobenius norm of a matrix.
pub fn frobenius_norm(matrix: ArrayView2<'_, f64>) -> f64 {
    if matrix.is_empty() {
        return 0.0;
    }
    matrix.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// Computes orthogonality error ||I - Q^T Q||_F.
pub fn orthogonality_error(q_matrix: ArrayView2<'_, f64>) -> Option<f64> {
    if q_matrix.nrows() == 0 || q_matrix.ncols() == 0 {
        return None;
    }
    let qtq = q_matrix.t().dot(&q_matrix);
    let identity = Array2::<f64>::eye(qtq.nrows());
    let diff = identity - qtq;
    Some(frobenius_norm(diff.view()))
}

/// Relative reconstruction error ||A - A_hat||_F / ||A||_F.
///
/// `None` on shape mismatch or empty input. A zero original only reconstructs
/// perfectly from zeros; anything else is reported as infinite error.
pub fn reconstruction_error(
    original: ArrayView2<'_, f64>,
    reconstructed: ArrayView2<'_, f64>,
) -> Option<f64> {
    if original.is_empty() || original.dim() != reconstructed.dim() {
        return None;
    }
    let diff = &original - &reconstructed;
    let norm_diff = frobenius_norm(diff.view());
    let norm_original = frobenius_norm(original);

    if norm_original < 1e-12 {
        if norm_diff < 1e-12 {
            Some(0.0)
        } else {
            Some(f64::INFINITY)
        }
    } else {
        Some(norm_diff / norm_original)
    }
}

/// Pearson correlation matrix between the columns of `data`.
///
/// Column pairs are independent, so rows of the result are filled in
/// parallel. A constant column correlates with nothing: its off-diagonal
/// entries are 0 and its diagonal entry is 1.
pub fn correlation_matrix(data: ArrayView2<'_, f64>) -> Array2<f64> {
    let (n_rows, n_cols) = data.dim();
    let mut correlation = Array2::<f64>::eye(n_cols);
    if n_rows < 2 || n_cols == 0 {
        return correlation;
    }

    let means = data.mean_axis(Axis(0)).unwrap_or_else(|| ndarray::Array1::zeros(n_cols));
    let centered = &data - &means;
    let scatter = centered.t().dot(&centered);
    let norms: Vec<f64> = (0..n_cols).map(|j| scatter[[j, j]].sqrt()).collect();

    correlation
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, mut row)| {
            for j in 0..n_cols {
                if i == j {
                    continue;
                }
                let denom = norms[i] * norms[j];
                row[j] = if denom > 1e-12 {
                    (scatter[[i, j]] / denom).clamp(-1.0, 1.0)
                } else {
                    0.0
                };
            }
        });
    correlation
}

/// Mean absolute value of the off-diagonal entries of a square matrix.
///
/// Summarizes how correlated a set of columns is; 0 for a diagonal matrix
/// or anything smaller than 2x2.
pub fn mean_abs_off_diagonal(matrix: ArrayView2<'_, f64>) -> f64 {
    let n = matrix.nrows().min(matrix.ncols());
    if n < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                total += matrix[[i, j]].abs();
            }
        }
    }
    total / (n * (n - 1)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn identity_is_orthonormal() {
        let eye = Array2::<f64>::eye(4);
        assert_abs_diff_eq!(orthogonality_error(eye.view()).unwrap(), 0.0);
        let scaled = eye * 2.0;
        assert!(orthogonality_error(scaled.view()).unwrap() > 1.0);
        assert!(orthogonality_error(Array2::<f64>::zeros((0, 3)).view()).is_none());
    }

    #[test]
    fn reconstruction_error_cases() {
        let a = array![[3.0, 4.0]];
        assert_abs_diff_eq!(reconstruction_error(a.view(), a.view()).unwrap(), 0.0);
        let b = array![[3.0, 0.0]];
        assert_abs_diff_eq!(reconstruction_error(a.view(), b.view()).unwrap(), 0.8);
        let zero = array![[0.0, 0.0]];
        assert_eq!(reconstruction_error(zero.view(), zero.view()), Some(0.0));
        assert_eq!(reconstruction_error(zero.view(), a.view()), Some(f64::INFINITY));
        assert!(reconstruction_error(a.view(), array![[1.0]].view()).is_none());
    }

    #[test]
    fn correlation_of_linear_columns() {
        let data = array![[1.0, 2.0, 5.0], [2.0, 4.0, 5.0], [3.0, 6.0, 5.0], [4.0, 8.0, 5.0]];
        let corr = correlation_matrix(data.view());
        assert_abs_diff_eq!(corr[[0, 1]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(corr[[1, 0]], 1.0, epsilon = 1e-12);
        // Constant third column.
        assert_eq!(corr[[0, 2]], 0.0);
        assert_eq!(corr[[2, 2]], 1.0);
    }

    #[test]
    fn anticorrelated_columns() {
        let data = array![[1.0, -1.0], [2.0, -2.0], [0.0, 0.0]];
        let corr = correlation_matrix(data.view());
        assert_abs_diff_eq!(corr[[0, 1]], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mean_abs_off_diagonal(corr.view()), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn off_diagonal_of_identity_is_zero() {
        assert_eq!(mean_abs_off_diagonal(Array2::<f64>::eye(5).view()), 0.0);
        assert_eq!(mean_abs_off_diagonal(Array2::<f64>::eye(1).view()), 0.0);
    }
}
