// src/pipeline.rs

use crate::centering::CenteredMatrix;
use crate::config::PipelineConfig;
use crate::diagnostics::{correlation_matrix, mean_abs_off_diagonal};
use crate::error::{AdcPcaError, Result};
use crate::loader::{load_raw_matrix, RawMatrix};
use crate::pca::{PcaEngine, PrincipalComponents};
use crate::projection::project;
use crate::split::SplitPlan;
use crate::summary::{row_means, DistributionSummary};
use log::{debug, info};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Wall-clock time of each stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTimings {
    pub load: Duration,
    pub center: Duration,
    pub split: Duration,
    pub fit: Duration,
    pub project_and_summarize: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.load + self.center + self.split + self.fit + self.project_and_summarize
    }
}

/// Correlation between samples before decorrelation (raw events) and between
/// components after it (projected testing block).
#[derive(Debug, Clone)]
pub struct CorrelationMatrices {
    pub before: Array2<f64>,
    pub after: Array2<f64>,
}

impl CorrelationMatrices {
    pub fn mean_abs_off_diagonal_before(&self) -> f64 {
        mean_abs_off_diagonal(self.before.view())
    }

    pub fn mean_abs_off_diagonal_after(&self) -> f64 {
        mean_abs_off_diagonal(self.after.view())
    }
}

/// Every artifact of one run. All arrays are final and read-only.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub raw: RawMatrix,
    pub centered: CenteredMatrix,
    pub split: SplitPlan,
    pub components: PrincipalComponents,
    /// Training block projected onto the basis. Shape: `(n_train, D)`.
    pub projected_train: Array2<f64>,
    /// Testing block projected onto the basis. Shape: `(n_test, D)`.
    pub projected_test: Array2<f64>,
    /// Mean ADC count of every raw event. Shape: `(rows)`.
    pub raw_row_means: Array1<f64>,
    /// Decorrelated training event means with the global mean restored. Shape: `(n_train)`.
    pub train_row_means: Array1<f64>,
    /// Decorrelated testing event means with the global mean restored. Shape: `(n_test)`.
    pub test_row_means: Array1<f64>,
    pub explained_variance_ratio: Array1<f64>,
    /// Raw samples, raw event means, decorrelated training and testing event means.
    pub distributions: Vec<DistributionSummary>,
    pub correlations: Option<CorrelationMatrices>,
    pub timings: StageTimings,
}

/// Serializable digest of a run for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub rows: usize,
    pub event_width: usize,
    pub global_mean: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub skipped_rows: usize,
    pub leading_variances: Vec<f64>,
    pub leading_variance_ratios: Vec<f64>,
    /// `(name, rms)` of every distribution.
    pub distribution_rms: Vec<(String, f64)>,
    pub correlation_before: Option<f64>,
    pub correlation_after: Option<f64>,
    pub timings: StageTimings,
}

/// Number of leading components listed in a report.
pub const REPORTED_COMPONENTS: usize = 6;

impl PipelineOutput {
    pub fn report(&self) -> PipelineReport {
        let take = REPORTED_COMPONENTS.min(self.components.n_components());
        PipelineReport {
            rows: self.raw.rows(),
            event_width: self.raw.event_width(),
            global_mean: self.centered.global_mean(),
            n_train: self.split.n_train(),
            n_test: self.split.n_test(),
            skipped_rows: self.split.gap(),
            leading_variances: self.components.variances().iter().take(take).cloned().collect(),
            leading_variance_ratios: self.explained_variance_ratio.iter().take(take).cloned().collect(),
            distribution_rms: self
                .distributions
                .iter()
                .map(|d| (d.name.clone(), d.rms))
                .collect(),
            correlation_before: self.correlations.as_ref().map(|c| c.mean_abs_off_diagonal_before()),
            correlation_after: self.correlations.as_ref().map(|c| c.mean_abs_off_diagonal_after()),
            timings: self.timings.clone(),
        }
    }

    /// Looks up a distribution by name.
    pub fn distribution(&self, name: &str) -> Option<&DistributionSummary> {
        self.distributions.iter().find(|d| d.name == name)
    }
}

pub const RAW_SAMPLES: &str = "1 sample";
pub const RAW_EVENT_MEANS: &str = "N samples";
pub const TRAIN_EVENT_MEANS: &str = "PCA [training]";
pub const TEST_EVENT_MEANS: &str = "PCA [testing]";

/// Runs load → center → split → fit → project → summarize.
///
/// Stages run strictly in order and the first error aborts the run, so a
/// returned [`PipelineOutput`] is always complete.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run_path<P: AsRef<Path>>(&self, path: P) -> Result<PipelineOutput> {
        let start = Instant::now();
        let raw = load_raw_matrix(path, self.config.event_width)?;
        self.run_loaded(raw, start.elapsed())
    }

    pub fn run_samples(&self, samples: &[i64]) -> Result<PipelineOutput> {
        let start = Instant::now();
        let raw = RawMatrix::from_samples(samples, self.config.event_width)?;
        self.run_loaded(raw, start.elapsed())
    }

    pub fn run_matrix(&self, raw: RawMatrix) -> Result<PipelineOutput> {
        if raw.event_width() != self.config.event_width {
            return Err(AdcPcaError::config(format!(
                "matrix has {} samples per event but the pipeline expects {}",
                raw.event_width(),
                self.config.event_width
            )));
        }
        self.run_loaded(raw, Duration::ZERO)
    }

    fn run_loaded(&self, raw: RawMatrix, load_time: Duration) -> Result<PipelineOutput> {
        let config = &self.config;
        let mut timings = StageTimings {
            load: load_time,
            ..Default::default()
        };
        if raw.rows() == 0 {
            return Err(AdcPcaError::config(format!(
                "no complete event of {} samples in the input",
                config.event_width
            )));
        }

        let start = Instant::now();
        let centered = CenteredMatrix::from_raw(&raw);
        timings.center = start.elapsed();
        info!(
            "{} events of {} samples, global mean {:.3} ADC counts (centered in {:?})",
            raw.rows(),
            raw.event_width(),
            centered.global_mean(),
            timings.center
        );

        info!(
            "Splitting events into training ({:.0}%) and testing ({:.0}%)",
            config.train_fraction * 100.0,
            (1.0 - config.train_fraction) * 100.0
        );
        let start = Instant::now();
        let split = SplitPlan::new(raw.rows(), config.train_fraction)?;
        let blocks = split.blocks(&centered, config.event_width)?;
        timings.split = start.elapsed();
        debug!(
            "Training rows {:?}, testing rows {:?}, {} row(s) in neither",
            split.train_range(),
            split.test_range(),
            split.gap()
        );

        let start = Instant::now();
        let components = PcaEngine::new(config.rank_tolerance).fit(blocks.train)?;
        timings.fit = start.elapsed();

        info!("Decorrelating events and averaging");
        let start = Instant::now();
        let basis = components.basis().view();
        let projected_train = project(blocks.train, basis)?;
        let projected_test = project(blocks.test, basis)?;

        let mean = centered.global_mean();
        let raw_row_means = row_means(raw.view(), 0.0);
        let train_row_means = row_means(projected_train.view(), mean);
        let test_row_means = row_means(projected_test.view(), mean);
        let explained_variance_ratio = components.explained_variance_ratio()?;

        let distributions = vec![
            DistributionSummary::from_values(RAW_SAMPLES, raw.data().iter().cloned(), &config.histogram)?,
            DistributionSummary::from_values(RAW_EVENT_MEANS, raw_row_means.iter().cloned(), &config.histogram)?,
            DistributionSummary::from_values(TRAIN_EVENT_MEANS, train_row_means.iter().cloned(), &config.histogram)?,
            DistributionSummary::from_values(TEST_EVENT_MEANS, test_row_means.iter().cloned(), &config.histogram)?,
        ];
        for d in &distributions {
            debug!("{}: {} entries, mean {:.3}, RMS {:.3}", d.name, d.entries, d.mean, d.rms);
        }

        let correlations = if config.compute_correlations {
            info!("Computing correlation matrices before and after decorrelation");
            Some(CorrelationMatrices {
                before: correlation_matrix(raw.view()),
                after: correlation_matrix(projected_test.view()),
            })
        } else {
            None
        };
        timings.project_and_summarize = start.elapsed();
        info!(
            "Decorrelated and summarized in {:?} (total {:?})",
            timings.project_and_summarize,
            timings.total()
        );

        Ok(PipelineOutput {
            raw,
            centered,
            split,
            components,
            projected_train,
            projected_test,
            raw_row_means,
            train_row_means,
            test_row_means,
            explained_variance_ratio,
            distributions,
            correlations,
            timings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::BaselineShiftedStream;

    #[test]
    fn invalid_config_is_rejected_up_front() {
        assert!(matches!(
            Pipeline::new(PipelineConfig::with_geometry(0, 0.5)),
            Err(AdcPcaError::Config(_))
        ));
    }

    #[test]
    fn empty_input_is_a_config_error() {
        let pipeline = Pipeline::new(PipelineConfig::with_geometry(10, 0.5)).unwrap();
        assert!(matches!(
            pipeline.run_samples(&[500; 9]),
            Err(AdcPcaError::Config(_))
        ));
    }

    #[test]
    fn matrix_width_must_match_config() {
        let pipeline = Pipeline::new(PipelineConfig::with_geometry(10, 0.5)).unwrap();
        let raw = RawMatrix::from_array(Array2::zeros((20, 8)));
        assert!(matches!(pipeline.run_matrix(raw), Err(AdcPcaError::Config(_))));
    }

    #[test]
    fn report_lists_leading_components() {
        let stream = BaselineShiftedStream {
            events: 201,
            event_width: 8,
            ..Default::default()
        };
        let pipeline = Pipeline::new(PipelineConfig::with_geometry(8, 0.5)).unwrap();
        let output = pipeline.run_samples(&stream.generate().unwrap()).unwrap();
        let report = output.report();
        assert_eq!(report.rows, 201);
        assert_eq!(report.n_train, 101);
        assert_eq!(report.n_test, 100);
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(report.leading_variances.len(), REPORTED_COMPONENTS);
        assert_eq!(report.distribution_rms.len(), 4);
        assert!(report.correlation_before.is_none());
        assert!(output.distribution(TEST_EVENT_MEANS).is_some());
    }
}
