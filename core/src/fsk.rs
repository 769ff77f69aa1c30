use crate::params::ModemParams;
use std::f64::consts::PI;

// Single-tone FSK over a 256-step ladder
//
// Frequency ladder (defaults):
// - symbol 0   -> 100 Hz
// - symbol 255 -> 2650 Hz (100 + 255*10)
// - one tone per segment, no taper, no guard interval
//
// Segments are concatenated back to back, so the segment length is the only framing.

/// Calculate the tone frequency for a symbol
/// freq_hz = base_frequency + symbol * frequency_step
pub fn symbol_to_frequency(params: &ModemParams, symbol: u8) -> f64 {
    params.base_frequency as f64 + symbol as f64 * params.frequency_step as f64
}

/// Map a measured frequency back onto the nearest ladder step, clamped to 0..=255
pub fn frequency_to_symbol(params: &ModemParams, freq: f64) -> u8 {
    let step = (freq - params.base_frequency as f64) / params.frequency_step as f64;
    step.round().clamp(0.0, 255.0) as u8
}

/// Generate one segment: `amplitude * sin(2*pi*f*t)` for t = i / sample_rate,
/// i in 0..round(duration * sample_rate).
///
/// Samples stay in floating point; quantization happens in the waveform writer.
pub fn generate_tone(frequency: f64, params: &ModemParams) -> Vec<f64> {
    let num_samples = params.segment_len();
    let angular_freq = 2.0 * PI * frequency / params.sample_rate as f64;

    (0..num_samples)
        .map(|i| params.amplitude * (angular_freq * i as f64).sin())
        .collect()
}

/// FSK modulator - one tone per byte
pub struct FskModulator {
    params: ModemParams,
}

impl FskModulator {
    pub fn new(params: ModemParams) -> Self {
        Self { params }
    }

    pub fn modulate_symbol(&self, symbol: u8) -> Vec<f64> {
        generate_tone(symbol_to_frequency(&self.params, symbol), &self.params)
    }
}
