// src/error.rs

use std::num::ParseIntError;
use thiserror::Error;

/// Errors raised by the decorrelation pipeline.
///
/// Every stage fails fast with the first problem it sees. Nothing is skipped
/// or patched up, since the statistics would otherwise describe an
/// undocumented subset of the events.
#[derive(Debug, Error)]
pub enum AdcPcaError {
    /// The sample source could not be opened or read.
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A line of the sample source is not an integer.
    #[error("line {line}: '{token}' is not an integer ADC sample: {source}")]
    Parse {
        /// 1-based line number in the source.
        line: usize,
        token: String,
        #[source]
        source: ParseIntError,
    },

    /// Invalid event width / train fraction, or a split that would be empty or inverted.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The eigensolver failed or the training covariance is degenerate.
    #[error("principal component decomposition failed: {0}")]
    Decomposition(String),
}

impl AdcPcaError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn decomposition(message: impl Into<String>) -> Self {
        Self::Decomposition(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AdcPcaError>;
