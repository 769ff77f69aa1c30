//! Dominant-frequency detection per window using `rustfft`

use crate::fsk::frequency_to_symbol;
use crate::params::ModemParams;
use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Recovers one symbol per window from the strongest FFT bin.
///
/// The transform for the full window length is planned once and shared across
/// threads; a short trailing window gets its own plan.
pub struct SpectralAnalyzer {
    params: ModemParams,
    window_len: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl SpectralAnalyzer {
    pub fn new(params: ModemParams) -> Self {
        let window_len = params.segment_len();
        let fft = FftPlanner::new().plan_fft_forward(window_len);
        Self {
            params,
            window_len,
            fft,
        }
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Index of the largest-magnitude bin among the first N/2 coefficients.
    /// Exact ties resolve to the lowest index.
    pub fn dominant_bin(&self, window: &[f64]) -> usize {
        let n = window.len();
        let mut buffer: Vec<Complex<f64>> =
            window.iter().map(|&s| Complex::new(s, 0.0)).collect();

        if n == self.window_len {
            self.fft.process(&mut buffer);
        } else {
            FftPlanner::new().plan_fft_forward(n).process(&mut buffer);
        }

        let mut best_bin = 0;
        let mut best_power = f64::NEG_INFINITY;
        for (bin, value) in buffer[..n / 2].iter().enumerate() {
            let power = value.norm_sqr();
            if power > best_power {
                best_power = power;
                best_bin = bin;
            }
        }
        best_bin
    }

    /// Frequency in Hz of the dominant bin: bin * sample_rate / N
    pub fn dominant_frequency(&self, window: &[f64]) -> f64 {
        let bin = self.dominant_bin(window);
        bin as f64 * self.params.sample_rate as f64 / window.len() as f64
    }

    pub fn analyze(&self, window: &[f64]) -> u8 {
        frequency_to_symbol(&self.params, self.dominant_frequency(window))
    }

    /// Analyze independent windows in parallel; output keeps window order
    pub fn analyze_batch(&self, windows: &[Vec<f64>]) -> Vec<u8> {
        windows.par_iter().map(|w| self.analyze(w)).collect()
    }
}
