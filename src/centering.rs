// src/centering.rs

use crate::loader::RawMatrix;
use ndarray::{Array2, ArrayView2};

/// Mean over every element of `data`, or 0 for an empty matrix.
pub fn global_mean(data: &Array2<f64>) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.sum() / data.len() as f64
}

/// The raw events with one scalar, the mean over all samples, subtracted.
///
/// Later stages add `global_mean` back to decorrelated row means, so this must
/// stay a single scalar and never become a per-row or per-column mean.
#[derive(Debug, Clone)]
pub struct CenteredMatrix {
    data: Array2<f64>,
    global_mean: f64,
}

impl CenteredMatrix {
    pub fn from_raw(raw: &RawMatrix) -> Self {
        let mean = global_mean(raw.data());
        let mut data = raw.data().clone();
        data.par_mapv_inplace(|v| v - mean);
        CenteredMatrix {
            data,
            global_mean: mean,
        }
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// The scalar that was subtracted from every sample.
    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn event_width(&self) -> usize {
        self.data.ncols()
    }
}
