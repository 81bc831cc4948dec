// Decorrelation of ADC event samples with principal component analysis (PCA)

#![doc = include_str!("../README.md")]

pub mod centering;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod linalg_backends;
pub mod loader;
pub mod pca;
pub mod pipeline;
pub mod projection;
pub mod split;
pub mod summary;
pub mod synthetic;

pub use centering::CenteredMatrix;
pub use config::{HistogramConfig, PipelineConfig};
pub use error::{AdcPcaError, Result};
pub use loader::{load_raw_matrix, parse_samples, read_samples, RawMatrix};
pub use pca::{PcaEngine, PrincipalComponents};
pub use pipeline::{Pipeline, PipelineOutput, PipelineReport, StageTimings};
pub use projection::{project, reconstruct};
pub use split::{SplitPlan, TrainTestBlocks};
pub use summary::{explained_variance_ratio, row_means, DistributionSummary, Histogram};
