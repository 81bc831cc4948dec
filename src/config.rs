// src/config.rs

use crate::error::{AdcPcaError, Result};
use serde::{Deserialize, Serialize};

/// Default number of samples per event.
pub const DEFAULT_EVENT_WIDTH: usize = 1000;
/// Default fraction of events used to learn the basis.
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.5;
/// Default relative eigenvalue floor below which the training covariance is
/// considered rank deficient.
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-10;

/// Binning of the per-event mean distributions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistogramConfig {
    /// Number of equal-width bins.
    pub bins: usize,
    /// Lower edge of the first bin, in ADC counts.
    pub min: f64,
    /// Upper edge of the last bin, in ADC counts.
    pub max: f64,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        HistogramConfig {
            bins: 300,
            min: 450.0,
            max: 650.0,
        }
    }
}

/// Parameters of one decorrelation run.
///
/// Fixed at construction and never read from the environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of consecutive samples forming one event (`D`).
    pub event_width: usize,
    /// Train fraction `fTrain` fed into the split formula.
    pub train_fraction: f64,
    /// Eigenvalues at or below `largest * rank_tolerance` make the fit fail.
    pub rank_tolerance: f64,
    /// Binning of the distribution summaries.
    pub histogram: HistogramConfig,
    /// Also compute the `D x D` correlation matrices before and after decorrelation.
    pub compute_correlations: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            event_width: DEFAULT_EVENT_WIDTH,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
            histogram: HistogramConfig::default(),
            compute_correlations: false,
        }
    }
}

impl PipelineConfig {
    /// Shorthand for a default configuration with a different event width and train fraction.
    pub fn with_geometry(event_width: usize, train_fraction: f64) -> Self {
        PipelineConfig {
            event_width,
            train_fraction,
            ..Self::default()
        }
    }

    /// Checks the values that do not depend on the data.
    ///
    /// Whether the split is non-empty depends on the number of rows and is
    /// checked by [`crate::split::SplitPlan::new`].
    pub fn validate(&self) -> Result<()> {
        if self.event_width == 0 {
            return Err(AdcPcaError::config("event width must be greater than 0"));
        }
        if !self.train_fraction.is_finite()
            || self.train_fraction <= 0.0
            || self.train_fraction >= 1.0
        {
            return Err(AdcPcaError::config(format!(
                "train fraction must lie strictly between 0 and 1, got {}",
                self.train_fraction
            )));
        }
        if !self.rank_tolerance.is_finite() || self.rank_tolerance < 0.0 {
            return Err(AdcPcaError::config(format!(
                "rank tolerance must be a finite non-negative number, got {}",
                self.rank_tolerance
            )));
        }
        let h = &self.histogram;
        if h.bins == 0 || !h.min.is_finite() || !h.max.is_finite() || h.min >= h.max {
            return Err(AdcPcaError::config(format!(
                "histogram needs at least one bin over a non-empty range, got {} bins over [{}, {})",
                h.bins, h.min, h.max
            )));
        }
        Ok(())
    }
}
