//! 16-bit mono PCM waveform I/O on top of `hound`
//!
//! The writer appends one segment at a time and the reader hands out one window at a
//! time, so neither side ever holds the whole waveform.

use crate::error::{ByteToneError, Result};
use crate::MAX_INT16;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

/// Container layout produced by the encoder and expected by the decoder
pub fn pcm_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Quantize a sample in [-1, 1] to 16-bit PCM
pub fn quantize(sample: f64) -> i16 {
    (sample.clamp(-1.0, 1.0) * MAX_INT16).round() as i16
}

/// Append-only 16-bit PCM writer
pub struct WaveformWriter<W: Write + Seek> {
    writer: WavWriter<W>,
    samples_written: u64,
}

impl<W: Write + Seek> WaveformWriter<W> {
    pub fn new(inner: W, sample_rate: u32) -> Result<Self> {
        Ok(Self {
            writer: WavWriter::new(inner, pcm_spec(sample_rate))?,
            samples_written: 0,
        })
    }

    /// Quantize and append one segment
    pub fn write_segment(&mut self, samples: &[f64]) -> Result<()> {
        for &sample in samples {
            self.writer.write_sample(quantize(sample))?;
        }
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    /// Patch the container header with the final length
    pub fn finalize(self) -> Result<u64> {
        let written = self.samples_written;
        self.writer.finalize()?;
        Ok(written)
    }
}

/// Mono 16-bit PCM reader with peak normalization
pub struct WaveformReader<R: Read + Seek> {
    reader: WavReader<R>,
}

impl WaveformReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read + Seek> WaveformReader<R> {
    pub fn new(inner: R) -> Result<Self> {
        let reader = WavReader::new(inner)?;
        let spec = reader.spec();
        if spec.channels != 1
            || spec.bits_per_sample != 16
            || spec.sample_format != SampleFormat::Int
        {
            return Err(ByteToneError::UnsupportedLayout(format!(
                "{} channel(s), {}-bit {:?}; expected mono 16-bit PCM",
                spec.channels, spec.bits_per_sample, spec.sample_format
            )));
        }
        Ok(Self { reader })
    }

    pub fn sample_rate(&self) -> u32 {
        self.reader.spec().sample_rate
    }

    /// Total samples in the container
    pub fn len(&self) -> u32 {
        self.reader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest absolute sample value, found in one pass; the reader is rewound afterwards
    pub fn peak(&mut self) -> Result<u16> {
        let mut peak = 0u16;
        for sample in self.reader.samples::<i16>() {
            peak = peak.max(sample?.unsigned_abs());
        }
        self.rewind()?;
        Ok(peak)
    }

    /// Scale factor mapping samples into [-1, 1].
    /// A silent waveform has no dominant frequency to recover.
    pub fn normalization(&mut self) -> Result<f64> {
        match self.peak()? {
            0 => Err(ByteToneError::SilentWaveform),
            peak => Ok(1.0 / peak as f64),
        }
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.reader.seek(0)?;
        Ok(())
    }

    /// Read up to `len` samples, scaled by `scale`. Returns fewer at end of stream.
    pub fn read_window(&mut self, len: usize, scale: f64) -> Result<Vec<f64>> {
        let mut window = Vec::with_capacity(len);
        for sample in self.reader.samples::<i16>().take(len) {
            window.push(sample? as f64 * scale);
        }
        Ok(window)
    }
}

/// Non-overlapping, gap-free windows of `window_len` samples starting at the reader's position
pub struct SegmentSlicer<'a, R: Read + Seek> {
    reader: &'a mut WaveformReader<R>,
    window_len: usize,
    scale: f64,
    finished: bool,
}

impl<'a, R: Read + Seek> SegmentSlicer<'a, R> {
    pub fn new(reader: &'a mut WaveformReader<R>, window_len: usize, scale: f64) -> Self {
        Self {
            reader,
            window_len,
            scale,
            finished: false,
        }
    }

    /// Next window, or None once fewer than 2 samples remain
    pub fn next_window(&mut self) -> Result<Option<Vec<f64>>> {
        if self.finished {
            return Ok(None);
        }
        let window = self.reader.read_window(self.window_len, self.scale)?;
        if window.len() < 2 {
            self.finished = true;
            return Ok(None);
        }
        if window.len() < self.window_len {
            self.finished = true;
        }
        Ok(Some(window))
    }

    /// Up to `max` windows in stream order
    pub fn next_batch(&mut self, max: usize) -> Result<Vec<Vec<f64>>> {
        let mut batch = Vec::with_capacity(max);
        while batch.len() < max {
            match self.next_window()? {
                Some(window) => batch.push(window),
                None => break,
            }
        }
        Ok(batch)
    }
}
