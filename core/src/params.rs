use crate::error::{ByteToneError, Result};
use crate::{
    BASE_FREQUENCY, DEFAULT_AMPLITUDE, DEFAULT_SAMPLE_RATE, DEFAULT_SYMBOL_DURATION_MS,
    FREQUENCY_STEP, MAX_SEGMENT_SAMPLES, NUM_SYMBOLS,
};

/// The parameter set an encoder and its matching decoder must agree on.
///
/// Any difference in sample rate or symbol duration shifts every FFT bin and silently
/// corrupts the recovered bytes, so the set is validated up front and carried in-band
/// by the waveform header (see [`crate::framing`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModemParams {
    pub sample_rate: u32,
    pub symbol_duration_ms: u32,
    pub base_frequency: u32,
    pub frequency_step: u32,
    /// Tone amplitude as a fraction of full scale (encode only)
    pub amplitude: f64,
}

impl Default for ModemParams {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            symbol_duration_ms: DEFAULT_SYMBOL_DURATION_MS,
            base_frequency: BASE_FREQUENCY,
            frequency_step: FREQUENCY_STEP,
            amplitude: DEFAULT_AMPLITUDE,
        }
    }
}

impl ModemParams {
    /// Default ladder and duration at the given sample rate.
    ///
    /// Header segments are always written with these, so a decoder can read them
    /// knowing nothing but the container's sample rate.
    pub fn bootstrap(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.symbol_duration_ms as f64 / 1000.0
    }

    /// Samples per segment: round(duration * sample_rate)
    pub fn segment_len(&self) -> usize {
        (self.duration_secs() * self.sample_rate as f64).round() as usize
    }

    /// Width in Hz of one FFT bin over a full segment
    pub fn bin_spacing(&self) -> f64 {
        self.sample_rate as f64 / self.segment_len() as f64
    }

    /// Frequency of the highest symbol (255)
    pub fn top_frequency(&self) -> f64 {
        self.base_frequency as f64 + (NUM_SYMBOLS - 1) as f64 * self.frequency_step as f64
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(invalid("sample rate must be positive"));
        }
        if self.symbol_duration_ms == 0 {
            return Err(invalid("symbol duration must be positive"));
        }
        if self.frequency_step == 0 {
            return Err(invalid("frequency step must be positive"));
        }
        if !(self.amplitude > 0.0 && self.amplitude <= 1.0) {
            return Err(invalid(format!(
                "amplitude {} is outside (0, 1]",
                self.amplitude
            )));
        }

        let n = self.segment_len();
        if n < 2 {
            return Err(invalid(format!(
                "{} ms at {} Hz gives {} samples per segment, need at least 2",
                self.symbol_duration_ms, self.sample_rate, n
            )));
        }
        if n > MAX_SEGMENT_SAMPLES {
            return Err(invalid(format!(
                "{} ms at {} Hz gives {} samples per segment, at most {} are supported",
                self.symbol_duration_ms, self.sample_rate, n, MAX_SEGMENT_SAMPLES
            )));
        }

        // Only the first N/2 bins are searched for the peak
        let spacing = self.bin_spacing();
        let highest_bin = (n / 2 - 1) as f64 * spacing;
        if self.top_frequency() > highest_bin {
            return Err(invalid(format!(
                "top tone {} Hz exceeds highest analyzed bin {:.1} Hz at {} Hz sample rate",
                self.top_frequency(),
                highest_bin,
                self.sample_rate
            )));
        }

        let step = self.frequency_step as f64;
        let on_bin_centers = is_multiple(self.base_frequency as f64, spacing)
            && is_multiple(step, spacing);
        if !on_bin_centers && spacing > step / 2.0 {
            return Err(invalid(format!(
                "bin spacing {:.3} Hz cannot resolve a {} Hz step off bin centers",
                spacing, self.frequency_step
            )));
        }
        if spacing > step {
            return Err(invalid(format!(
                "bin spacing {:.3} Hz is coarser than the {} Hz step",
                spacing, self.frequency_step
            )));
        }

        Ok(())
    }
}

fn is_multiple(value: f64, unit: f64) -> bool {
    let ratio = value / unit;
    (ratio - ratio.round()).abs() < 1e-9
}

fn invalid(msg: impl Into<String>) -> ByteToneError {
    ByteToneError::InvalidParams(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = ModemParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.segment_len(), 750);
        assert!((params.bin_spacing() - 10.0).abs() < 1e-12);
        assert_eq!(params.top_frequency(), 2650.0);
    }

    #[test]
    fn test_8khz_is_valid() {
        let params = ModemParams::bootstrap(8000);
        assert!(params.validate().is_ok());
        assert_eq!(params.segment_len(), 800);
    }

    #[test]
    fn test_segment_len_rounds() {
        let params = ModemParams {
            sample_rate: 44100,
            symbol_duration_ms: 33,
            ..Default::default()
        };
        // 0.033 * 44100 = 1455.3
        assert_eq!(params.segment_len(), 1455);
    }

    #[test]
    fn test_rejects_top_tone_above_nyquist() {
        let params = ModemParams::bootstrap(5000);
        assert!(matches!(
            params.validate(),
            Err(ByteToneError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_rejects_coarse_bins() {
        // 20 ms segments give 50 Hz bins, far coarser than a 10 Hz step
        let params = ModemParams {
            symbol_duration_ms: 20,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_off_center_tones_at_full_spacing() {
        let params = ModemParams {
            base_frequency: 105,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        // Halving the bin spacing makes the same ladder resolvable
        let finer = ModemParams {
            base_frequency: 105,
            symbol_duration_ms: 200,
            ..Default::default()
        };
        assert!(finer.validate().is_ok());
    }

    #[test]
    fn test_rejects_oversized_segments() {
        let params = ModemParams {
            sample_rate: 4_000_000,
            symbol_duration_ms: 4_000_000,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ByteToneError::InvalidParams(_))
        ));

        // Just under the cap is still accepted
        let params = ModemParams {
            sample_rate: 160_000,
            symbol_duration_ms: 100_000,
            ..Default::default()
        };
        assert!(params.segment_len() <= MAX_SEGMENT_SAMPLES);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_values() {
        for params in [
            ModemParams {
                sample_rate: 0,
                ..Default::default()
            },
            ModemParams {
                symbol_duration_ms: 0,
                ..Default::default()
            },
            ModemParams {
                frequency_step: 0,
                ..Default::default()
            },
            ModemParams {
                amplitude: 0.0,
                ..Default::default()
            },
            ModemParams {
                amplitude: 1.5,
                ..Default::default()
            },
        ] {
            assert!(params.validate().is_err(), "{:?} should be rejected", params);
        }
    }
}
