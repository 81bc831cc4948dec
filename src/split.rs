// src/split.rs

use crate::centering::CenteredMatrix;
use crate::error::{AdcPcaError, Result};
use ndarray::{s, ArrayView2};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Row counts of the training and testing blocks.
///
/// The counts follow the legacy index arithmetic
///
/// ```text
/// n_train = floor((rows + 1) * f)
/// n_test  = rows - floor(rows * f + 1)
/// ```
///
/// with the training block taken from the top of the matrix and the testing
/// block from the bottom. Depending on `rows` the testing block may start one
/// row after the training block ends; that row belongs to neither block.
/// The arithmetic is kept as is so that block sizes match earlier results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPlan {
    rows: usize,
    n_train: usize,
    n_test: usize,
}

impl SplitPlan {
    pub fn new(rows: usize, train_fraction: f64) -> Result<Self> {
        if !train_fraction.is_finite() || train_fraction <= 0.0 || train_fraction >= 1.0 {
            return Err(AdcPcaError::config(format!(
                "train fraction must lie strictly between 0 and 1, got {}",
                train_fraction
            )));
        }
        let rows_i = rows as i64;
        let n_train = ((rows + 1) as f64 * train_fraction).floor() as i64;
        let n_test = rows_i - (rows as f64 * train_fraction + 1.0).floor() as i64;

        if n_train <= 0 || n_test <= 0 || n_train > rows_i || n_test > rows_i {
            return Err(AdcPcaError::config(format!(
                "{} events with train fraction {} give n_train={} and n_test={}; both must be in 1..={}",
                rows, train_fraction, n_train, n_test, rows
            )));
        }

        Ok(SplitPlan {
            rows,
            n_train: n_train as usize,
            n_test: n_test as usize,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn n_train(&self) -> usize {
        self.n_train
    }

    pub fn n_test(&self) -> usize {
        self.n_test
    }

    pub fn train_range(&self) -> Range<usize> {
        0..self.n_train
    }

    pub fn test_range(&self) -> Range<usize> {
        (self.rows - self.n_test)..self.rows
    }

    /// Rows between the two blocks that belong to neither.
    pub fn gap(&self) -> usize {
        self.test_range().start.saturating_sub(self.n_train)
    }

    /// Rows that belong to both blocks.
    pub fn overlap(&self) -> usize {
        self.n_train.saturating_sub(self.test_range().start)
    }

    /// Borrows the two blocks, restricted to the first `event_width` columns.
    pub fn blocks<'a>(
        &self,
        centered: &'a CenteredMatrix,
        event_width: usize,
    ) -> Result<TrainTestBlocks<'a>> {
        if centered.rows() != self.rows {
            return Err(AdcPcaError::config(format!(
                "split planned for {} rows but the centered matrix has {}",
                self.rows,
                centered.rows()
            )));
        }
        if event_width == 0 || event_width > centered.event_width() {
            return Err(AdcPcaError::config(format!(
                "event width {} does not fit a matrix with {} columns",
                event_width,
                centered.event_width()
            )));
        }
        let data = centered.data();
        let train = self.train_range();
        let test = self.test_range();
        Ok(TrainTestBlocks {
            train: data.slice(s![train.start..train.end, ..event_width]),
            test: data.slice(s![test.start..test.end, ..event_width]),
        })
    }
}

/// Views into the centered matrix; nothing is copied.
#[derive(Debug, Clone)]
pub struct TrainTestBlocks<'a> {
    pub train: ArrayView2<'a, f64>,
    pub test: ArrayView2<'a, f64>,
}
