// Principal components of the training events

use crate::config::DEFAULT_RANK_TOLERANCE;
use crate::error::{AdcPcaError, Result};
use crate::linalg_backends::{BackendEigh, LinAlgBackendProvider};
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Column means and `n - 1` sample covariance of `block`.
///
/// Returns `(covariance, column_means)`. The covariance is `D x D` and exactly
/// symmetric: the upper triangle is mirrored onto the lower one.
pub fn covariance_matrix(block: ArrayView2<'_, f64>) -> Result<(Array2<f64>, Array1<f64>)> {
    let n_rows = block.nrows();
    if n_rows < 2 {
        return Err(AdcPcaError::decomposition(format!(
            "covariance needs at least 2 rows, got {}",
            n_rows
        )));
    }
    let column_means = block
        .mean_axis(Axis(0))
        .ok_or_else(|| AdcPcaError::decomposition("failed to compute column means"))?;
    let centered = &block - &column_means;

    let mut covariance = centered.t().dot(&centered);
    covariance /= (n_rows - 1) as f64;

    let d = covariance.nrows();
    for i in 0..d {
        for j in (i + 1)..d {
            covariance[[j, i]] = covariance[[i, j]];
        }
    }
    Ok((covariance, column_means))
}

/// Flips `vector` so that its largest-magnitude entry is positive.
///
/// The first entry wins ties, which keeps the sign stable across runs.
fn fix_sign(vector: &mut Array1<f64>) {
    let mut pivot = 0.0_f64;
    for &v in vector.iter() {
        if v.abs() > pivot.abs() {
            pivot = v;
        }
    }
    if pivot < 0.0 {
        vector.mapv_inplace(|x| -x);
    }
}

/// The learned decorrelation basis.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PrincipalComponents {
    /// Principal axes as columns, by descending variance. Shape: `(D, D)`.
    basis: Array2<f64>,
    /// Eigenvalues of the training covariance matching `basis` columns. Shape: `(D)`.
    variances: Array1<f64>,
    /// Per-column means of the training block. Shape: `(D)`.
    column_means: Array1<f64>,
    n_train_rows: usize,
}

impl PrincipalComponents {
    pub fn basis(&self) -> &Array2<f64> {
        &self.basis
    }

    pub fn variances(&self) -> &Array1<f64> {
        &self.variances
    }

    /// Means of the training block's columns, used to estimate the covariance.
    ///
    /// Projection does not subtract them; blocks are projected as centered by
    /// the global mean only.
    pub fn column_means(&self) -> &Array1<f64> {
        &self.column_means
    }

    pub fn n_train_rows(&self) -> usize {
        self.n_train_rows
    }

    /// Number of components, equal to the event width.
    pub fn n_components(&self) -> usize {
        self.basis.ncols()
    }

    /// The `i`-th principal axis (loadings over the samples of an event).
    pub fn component(&self, i: usize) -> Option<ArrayView1<'_, f64>> {
        (i < self.basis.ncols()).then(|| self.basis.column(i))
    }

    /// `variances[i] / sum(variances)`.
    pub fn explained_variance_ratio(&self) -> Result<Array1<f64>> {
        crate::summary::explained_variance_ratio(self.variances.view())
    }

    pub fn total_variance(&self) -> f64 {
        self.variances.sum()
    }
}

/// Fits the full `D x D` basis on a training block with a symmetric eigensolver.
///
/// Every one of the `D` eigenpairs must be numerically stable: a covariance of
/// rank below `D` is reported as an error instead of being padded or truncated.
#[derive(Debug, Clone)]
pub struct PcaEngine {
    rank_tolerance: f64,
}

impl Default for PcaEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RANK_TOLERANCE)
    }
}

impl PcaEngine {
    /// `rank_tolerance` is the fraction of the largest eigenvalue at or below
    /// which an eigenvalue counts as zero.
    pub fn new(rank_tolerance: f64) -> Self {
        Self { rank_tolerance }
    }

    pub fn rank_tolerance(&self) -> f64 {
        self.rank_tolerance
    }

    /// Computes the principal components of `train`.
    ///
    /// # Errors
    /// Returns [`AdcPcaError::Decomposition`] if:
    /// - there are fewer than 2 rows, or no more rows than columns (the
    ///   column-centered block then has rank at most `rows - 1 < D`);
    /// - the eigensolver fails or returns non-finite values;
    /// - the covariance is zero (all rows identical);
    /// - any eigenvalue is at or below `largest * rank_tolerance`.
    pub fn fit(&self, train: ArrayView2<'_, f64>) -> Result<PrincipalComponents> {
        let (n_rows, n_features) = train.dim();
        if n_features == 0 {
            return Err(AdcPcaError::decomposition("training block has zero columns"));
        }
        if n_rows < 2 || n_rows <= n_features {
            return Err(AdcPcaError::decomposition(format!(
                "training block has {} rows for {} dimensions; at least {} rows are needed for a full-rank covariance",
                n_rows,
                n_features,
                n_features + 1
            )));
        }

        info!(
            "Diagonalizing {}x{} covariance of {} training events.",
            n_features, n_features, n_rows
        );
        let start = std::time::Instant::now();

        let (covariance, column_means) = covariance_matrix(train)?;
        debug!("Covariance trace = {:.6e}", covariance.diag().sum());

        let backend = LinAlgBackendProvider::<f64>::new();
        let eigh = backend
            .eigh_upper(&covariance)
            .map_err(|e| AdcPcaError::decomposition(format!("eigensolver failed: {}", e)))?;

        if eigh.eigenvalues.len() != n_features || eigh.eigenvectors.dim() != (n_features, n_features) {
            return Err(AdcPcaError::decomposition(format!(
                "eigensolver returned {} eigenvalues and a {:?} eigenvector matrix for a {}x{} covariance",
                eigh.eigenvalues.len(),
                eigh.eigenvectors.dim(),
                n_features,
                n_features
            )));
        }
        if eigh.eigenvalues.iter().any(|v| !v.is_finite())
            || eigh.eigenvectors.iter().any(|v| !v.is_finite())
        {
            return Err(AdcPcaError::decomposition("eigensolver returned non-finite values"));
        }

        let mut eig_pairs: Vec<(f64, Array1<f64>)> = eigh
            .eigenvalues
            .into_iter()
            .zip(eigh.eigenvectors.columns().into_iter().map(|col| col.to_owned()))
            .collect();
        eig_pairs.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let largest = eig_pairs[0].0;
        if largest <= 0.0 {
            return Err(AdcPcaError::decomposition(
                "training covariance is zero; every event is identical after centering",
            ));
        }
        let threshold = largest * self.rank_tolerance;
        let stable = eig_pairs.iter().take_while(|(val, _)| *val > threshold).count();
        if stable < n_features {
            return Err(AdcPcaError::decomposition(format!(
                "training covariance has numerical rank {} of {} (eigenvalues at or below {:.3e} = {:.1e} x largest)",
                stable, n_features, threshold, self.rank_tolerance
            )));
        }

        let mut basis = Array2::<f64>::zeros((n_features, n_features));
        let mut variances = Array1::<f64>::zeros(n_features);
        for (i, (value, mut vector)) in eig_pairs.into_iter().enumerate() {
            let norm = vector.dot(&vector).sqrt();
            if norm <= 1e-12 {
                return Err(AdcPcaError::decomposition(format!(
                    "eigenvector {} has near-zero norm {:.3e}",
                    i, norm
                )));
            }
            vector.mapv_inplace(|x| x / norm);
            fix_sign(&mut vector);
            basis.column_mut(i).assign(&vector);
            variances[i] = value;
        }

        info!("Diagonalized training covariance in {:?}", start.elapsed());
        debug!(
            "Leading variances: {:?}",
            variances.iter().take(6).collect::<Vec<_>>()
        );

        Ok(PrincipalComponents {
            basis,
            variances,
            column_means,
            n_train_rows: n_rows,
        })
    }
}

#[cfg(test)]
#[path = "pca_tests.rs"]
mod pca_tests;
