// src/synthetic.rs

use crate::error::{AdcPcaError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

/// Lower bound (inclusive) of the white-noise ADC counts.
pub const WHITE_NOISE_LOW: i64 = 450;
/// Upper bound (exclusive) of the white-noise ADC counts.
pub const WHITE_NOISE_HIGH: i64 = 500;

/// `n` independent ADC counts drawn uniformly from `[450, 500)`.
///
/// Has no inter-sample correlation, which makes it a reference stream for the
/// decorrelation.
pub fn white_noise_samples(n: usize, seed: u64) -> Vec<i64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| rng.gen_range(WHITE_NOISE_LOW..WHITE_NOISE_HIGH))
        .collect()
}

/// Shape of a synthetic stream with a per-event baseline offset.
#[derive(Clone, Debug)]
pub struct BaselineShiftedStream {
    pub events: usize,
    pub event_width: usize,
    /// Nominal pedestal in ADC counts.
    pub baseline: f64,
    /// Standard deviation of the offset shared by all samples of one event.
    pub offset_sigma: f64,
    /// Standard deviation of the independent per-sample noise.
    pub noise_sigma: f64,
    pub seed: u64,
}

impl Default for BaselineShiftedStream {
    fn default() -> Self {
        BaselineShiftedStream {
            events: 2000,
            event_width: 100,
            baseline: 550.0,
            offset_sigma: 8.0,
            noise_sigma: 3.0,
            seed: 2025,
        }
    }
}

impl BaselineShiftedStream {
    /// Generates `events * event_width` samples rounded to integer ADC counts.
    ///
    /// # Errors
    /// Returns [`AdcPcaError::Config`] unless both sigmas are finite and non-negative.
    pub fn generate(&self) -> Result<Vec<i64>> {
        for (name, sigma) in [("offset", self.offset_sigma), ("noise", self.noise_sigma)] {
            if !sigma.is_finite() || sigma < 0.0 {
                return Err(AdcPcaError::config(format!(
                    "{} sigma must be finite and non-negative, got {}",
                    name, sigma
                )));
            }
        }
        let offset = Normal::new(0.0, self.offset_sigma).map_err(|e| {
            AdcPcaError::config(format!("invalid offset sigma {}: {}", self.offset_sigma, e))
        })?;
        let noise = Normal::new(0.0, self.noise_sigma).map_err(|e| {
            AdcPcaError::config(format!("invalid noise sigma {}: {}", self.noise_sigma, e))
        })?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut samples = Vec::with_capacity(self.events * self.event_width);
        for _ in 0..self.events {
            let shift = self.baseline + rng.sample(offset);
            for _ in 0..self.event_width {
                samples.push((shift + rng.sample(noise)).round() as i64);
            }
        }
        Ok(samples)
    }
}
