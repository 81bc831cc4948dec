// src/summary.rs

use crate::config::HistogramConfig;
use crate::error::{AdcPcaError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-row mean plus `offset`.
///
/// Use `offset = 0` for raw events and `offset = global mean` for projected
/// blocks, which brings decorrelated means back to ADC counts.
/// A matrix with zero columns yields `offset` for every row.
pub fn row_means(matrix: ArrayView2<'_, f64>, offset: f64) -> Array1<f64> {
    let width = matrix.ncols();
    if width == 0 {
        return Array1::from_elem(matrix.nrows(), offset);
    }
    let means: Vec<f64> = matrix
        .axis_iter(Axis(0))
        .into_par_iter()
        .map(|row| row.sum() / width as f64 + offset)
        .collect();
    Array1::from(means)
}

/// `variances[i] / sum(variances)`; sums to 1.
pub fn explained_variance_ratio(variances: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
    let total = variances.sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(AdcPcaError::decomposition(format!(
            "total variance must be positive to form ratios, got {}",
            total
        )));
    }
    Ok(variances.mapv(|v| v / total))
}

/// Fixed-width 1-D histogram.
///
/// Besides the bin contents it keeps running moments of every filled value,
/// including under- and overflow, so `mean` and `std_dev` do not depend on the
/// binning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    min: f64,
    max: f64,
    bins: Vec<f64>,
    underflow: f64,
    overflow: f64,
    entries: usize,
    sum_w: f64,
    sum_w2: f64,
    sum_wx: f64,
    sum_wx2: f64,
}

impl Histogram {
    pub fn new(n_bins: usize, min: f64, max: f64) -> Result<Self> {
        if n_bins == 0 || !min.is_finite() || !max.is_finite() || min >= max {
            return Err(AdcPcaError::config(format!(
                "histogram needs at least one bin over a non-empty range, got {} bins over [{}, {})",
                n_bins, min, max
            )));
        }
        Ok(Histogram {
            min,
            max,
            bins: vec![0.0; n_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
            sum_w: 0.0,
            sum_w2: 0.0,
            sum_wx: 0.0,
            sum_wx2: 0.0,
        })
    }

    pub fn from_config(config: &HistogramConfig) -> Result<Self> {
        Self::new(config.bins, config.min, config.max)
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bins.len() as f64
    }

    pub fn fill(&mut self, x: f64, weight: f64) {
        self.entries += 1;
        self.sum_w += weight;
        self.sum_w2 += weight * weight;
        self.sum_wx += weight * x;
        self.sum_wx2 += weight * x * x;

        if x < self.min {
            self.underflow += weight;
        } else if x >= self.max {
            self.overflow += weight;
        } else {
            let idx = ((x - self.min) / self.bin_width()) as usize;
            // Rounding can push values just below `max` into a non-existent bin.
            let idx = idx.min(self.bins.len() - 1);
            self.bins[idx] += weight;
        }
    }

    pub fn fill_all<I: IntoIterator<Item = f64>>(&mut self, values: I) {
        for x in values {
            self.fill(x, 1.0);
        }
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn underflow(&self) -> f64 {
        self.underflow
    }

    pub fn overflow(&self) -> f64 {
        self.overflow
    }

    /// Lower edge of every bin.
    pub fn bin_edges(&self) -> Vec<f64> {
        let width = self.bin_width();
        (0..self.bins.len()).map(|i| self.min + i as f64 * width).collect()
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.bins.iter().sum()
    }

    /// Weighted mean of every filled value, `NaN` when empty.
    pub fn mean(&self) -> f64 {
        if self.sum_w == 0.0 {
            return f64::NAN;
        }
        self.sum_wx / self.sum_w
    }

    /// Unbiased weighted standard deviation of every filled value, the RMS
    /// quoted next to a plotted distribution:
    /// `sqrt((Σw·Σwx² − (Σwx)²) / ((Σw)² − Σw²))`.
    ///
    /// With unit weights this is the `n - 1` sample standard deviation. `NaN`
    /// with fewer than two effective entries.
    pub fn std_dev(&self) -> f64 {
        let denom = self.sum_w * self.sum_w - self.sum_w2;
        if denom <= 0.0 {
            return f64::NAN;
        }
        let num = self.sum_w * self.sum_wx2 - self.sum_wx * self.sum_wx;
        (num.max(0.0) / denom).sqrt()
    }

    /// Bin contents scaled to a unit integral; all zeros if nothing is in range.
    pub fn normalized(&self) -> Vec<f64> {
        let integral = self.integral();
        if integral <= 0.0 {
            return vec![0.0; self.bins.len()];
        }
        self.bins.iter().map(|b| b / integral).collect()
    }
}

/// One named per-event distribution, as drawn in a "sample distribution" panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub name: String,
    pub entries: usize,
    pub mean: f64,
    /// Standard deviation of the values; the figure of merit for decorrelation.
    pub rms: f64,
    pub histogram: Histogram,
}

impl DistributionSummary {
    pub fn from_values<I: IntoIterator<Item = f64>>(
        name: impl Into<String>,
        values: I,
        config: &HistogramConfig,
    ) -> Result<Self> {
        let mut histogram = Histogram::from_config(config)?;
        histogram.fill_all(values);
        Ok(DistributionSummary {
            name: name.into(),
            entries: histogram.entries(),
            mean: histogram.mean(),
            rms: histogram.std_dev(),
            histogram,
        })
    }

    /// Bin densities summing to 1 over the in-range bins.
    pub fn density(&self) -> Vec<f64> {
        self.histogram.normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn row_means_with_and_without_offset() {
        let m = array![[1.0, 2.0, 3.0], [4.0, 4.0, 4.0]];
        assert_eq!(row_means(m.view(), 0.0), array![2.0, 4.0]);
        assert_eq!(row_means(m.view(), 500.0), array![502.0, 504.0]);
    }

    #[test]
    fn row_means_keep_row_order_on_large_input() {
        let m = ndarray::Array2::from_shape_fn((5000, 8), |(i, _)| i as f64);
        let means = row_means(m.view(), 1.0);
        assert_eq!(means.len(), 5000);
        for (i, &v) in means.iter().enumerate() {
            assert_abs_diff_eq!(v, i as f64 + 1.0);
        }
    }

    #[test]
    fn ratio_sums_to_one() {
        let ratio = explained_variance_ratio(array![6.0, 3.0, 1.0].view()).unwrap();
        assert_abs_diff_eq!(ratio[0], 0.6);
        assert_abs_diff_eq!(ratio.sum(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn ratio_of_zero_variance_fails() {
        assert!(matches!(
            explained_variance_ratio(array![0.0, 0.0].view()),
            Err(AdcPcaError::Decomposition(_))
        ));
    }

    #[test]
    fn histogram_bins_and_moments() {
        let mut h = Histogram::new(4, 0.0, 4.0).unwrap();
        h.fill_all([0.5, 1.5, 1.7, 3.9, -1.0, 4.0]);
        assert_eq!(h.bins(), &[1.0, 2.0, 0.0, 1.0]);
        assert_eq!(h.underflow(), 1.0);
        assert_eq!(h.overflow(), 1.0);
        assert_eq!(h.entries(), 6);
        assert_abs_diff_eq!(h.integral(), 4.0);
        assert_abs_diff_eq!(h.mean(), (0.5 + 1.5 + 1.7 + 3.9 - 1.0 + 4.0) / 6.0, epsilon = 1e-12);
        assert_eq!(h.bin_edges(), vec![0.0, 1.0, 2.0, 3.0]);

        let density = h.normalized();
        assert_abs_diff_eq!(density.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(density[1], 0.5);
    }

    #[test]
    fn histogram_rms_is_unbiased_std_dev() {
        let values = [480.0, 490.0, 500.0, 510.0, 520.0];
        let mut h = Histogram::new(300, 450.0, 650.0).unwrap();
        h.fill_all(values);
        let expected = (values.iter().map(|v| (v - 500.0_f64).powi(2)).sum::<f64>() / 4.0).sqrt();
        assert_abs_diff_eq!(h.mean(), 500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(h.std_dev(), expected, epsilon = 1e-9);

        let mut pair = Histogram::new(300, 450.0, 650.0).unwrap();
        pair.fill_all([500.0, 502.0]);
        assert_abs_diff_eq!(pair.std_dev(), 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn weighted_rms_uses_effective_entries() {
        // Weight 2 on one value is not the same as filling it twice.
        let mut h = Histogram::new(10, 0.0, 10.0).unwrap();
        h.fill(1.0, 1.0);
        h.fill(3.0, 2.0);
        // Σw = 3, Σw² = 5, Σwx = 7, Σwx² = 19
        let expected = ((3.0 * 19.0 - 49.0) / (9.0 - 5.0_f64)).sqrt();
        assert_abs_diff_eq!(h.std_dev(), expected, epsilon = 1e-12);

        let mut single = Histogram::new(10, 0.0, 10.0).unwrap();
        single.fill(5.0, 1.0);
        assert!(single.std_dev().is_nan());
    }

    #[test]
    fn empty_histogram_has_no_moments() {
        let h = Histogram::new(10, 0.0, 1.0).unwrap();
        assert!(h.mean().is_nan());
        assert!(h.std_dev().is_nan());
        assert!(h.normalized().iter().all(|&v| v == 0.0));
        assert!(Histogram::new(0, 0.0, 1.0).is_err());
        assert!(Histogram::new(3, 1.0, 1.0).is_err());
    }

    #[test]
    fn distribution_summary_from_values() {
        let config = HistogramConfig { bins: 10, min: 0.0, max: 10.0 };
        let summary = DistributionSummary::from_values("raw", vec![1.0, 3.0, 5.0], &config).unwrap();
        assert_eq!(summary.name, "raw");
        assert_eq!(summary.entries, 3);
        assert_abs_diff_eq!(summary.mean, 3.0);
        assert_abs_diff_eq!(summary.rms, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.density().iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }
}
