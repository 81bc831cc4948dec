// src/projection.rs

use crate::error::{AdcPcaError, Result};
use ndarray::{Array2, ArrayView2};

/// Maps a centered block onto the principal axes: `block · basis`.
///
/// The basis is always the one learned from the training block; applying it
/// unchanged to the testing block is what measures how well it generalizes.
pub fn project(block: ArrayView2<'_, f64>, basis: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    if block.ncols() != basis.nrows() {
        return Err(AdcPcaError::config(format!(
            "cannot project a block with {} columns onto a basis with {} rows",
            block.ncols(),
            basis.nrows()
        )));
    }
    Ok(block.dot(&basis))
}

/// Maps projected data back to sample space: `projected · basisᵀ`.
///
/// This is the inverse of [`project`] when `basis` is square and orthonormal.
pub fn reconstruct(projected: ArrayView2<'_, f64>, basis: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    if projected.ncols() != basis.ncols() {
        return Err(AdcPcaError::config(format!(
            "cannot reconstruct {} components with a basis of {} columns",
            projected.ncols(),
            basis.ncols()
        )));
    }
    Ok(projected.dot(&basis.t()))
}
